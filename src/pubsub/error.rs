use std::fmt;

/// Errors that can occur while talking to Twitch PubSub
#[derive(Debug, Clone, PartialEq)]
pub enum PubSubError {
    /// Transport could not be established (retryable)
    ConnectError(String),

    /// Operation attempted while the connection is down
    NotConnected,

    /// Frame or payload did not match its declared type
    MalformedMessage(String),

    /// Upstream rejected a LISTEN/UNLISTEN after all retries
    SubscriptionFailed { topic: String, reason: String },

    /// No PONG arrived before the keepalive deadline
    StaleConnection,

    /// Transport failure on an established connection
    WebSocketError(String),

    /// Configuration error
    ConfigError(String),

    /// The client was closed and cannot be reused
    Closed,
}

impl fmt::Display for PubSubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PubSubError::ConnectError(msg) => write!(f, "Connect error: {}", msg),
            PubSubError::NotConnected => write!(f, "Not connected"),
            PubSubError::MalformedMessage(msg) => write!(f, "Malformed message: {}", msg),
            PubSubError::SubscriptionFailed { topic, reason } => {
                write!(f, "Subscription to {} failed: {}", topic, reason)
            }
            PubSubError::StaleConnection => write!(f, "Keepalive timeout - connection stale"),
            PubSubError::WebSocketError(msg) => write!(f, "WebSocket error: {}", msg),
            PubSubError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            PubSubError::Closed => write!(f, "Client closed"),
        }
    }
}

impl std::error::Error for PubSubError {}

impl From<tokio_tungstenite::tungstenite::Error> for PubSubError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        PubSubError::WebSocketError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PubSubError>;
