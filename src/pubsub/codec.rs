use serde::{Deserialize, Serialize};

use super::error::{PubSubError, Result};

/// Wire envelope exchanged with the PubSub edge
///
/// Every frame is a JSON object tagged by `type`. Control requests carry a
/// client-generated `nonce` which the server echoes back in its RESPONSE.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Envelope {
    Listen { nonce: String, data: ListenData },
    Unlisten { nonce: String, data: UnlistenData },
    Ping,
    Pong,
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nonce: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    Message { data: MessageData },
    Reconnect,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ListenData {
    pub topics: Vec<String>,
    pub auth_token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnlistenData {
    pub topics: Vec<String>,
}

/// Topic notification; `message` is itself a JSON document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageData {
    pub topic: String,
    pub message: String,
}

impl Envelope {
    /// Upper-case type tag, as written on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            Envelope::Listen { .. } => "LISTEN",
            Envelope::Unlisten { .. } => "UNLISTEN",
            Envelope::Ping => "PING",
            Envelope::Pong => "PONG",
            Envelope::Response { .. } => "RESPONSE",
            Envelope::Message { .. } => "MESSAGE",
            Envelope::Reconnect => "RECONNECT",
        }
    }

    /// Error string of a RESPONSE, `None` when the request succeeded
    pub fn response_error(&self) -> Option<&str> {
        match self {
            Envelope::Response {
                error: Some(error), ..
            } if !error.is_empty() => Some(error),
            _ => None,
        }
    }
}

fn encode(envelope: &Envelope) -> String {
    // Every variant is plain strings and vectors, serialization cannot fail.
    serde_json::to_string(envelope).unwrap_or_default()
}

pub fn encode_listen(nonce: &str, topics: &[String], auth_token: &str) -> String {
    encode(&Envelope::Listen {
        nonce: nonce.to_string(),
        data: ListenData {
            topics: topics.to_vec(),
            auth_token: auth_token.to_string(),
        },
    })
}

pub fn encode_unlisten(nonce: &str, topics: &[String]) -> String {
    encode(&Envelope::Unlisten {
        nonce: nonce.to_string(),
        data: UnlistenData {
            topics: topics.to_vec(),
        },
    })
}

pub fn encode_ping() -> String {
    encode(&Envelope::Ping)
}

pub fn encode_pong() -> String {
    encode(&Envelope::Pong)
}

pub fn encode_response(nonce: &str, error: &str) -> String {
    encode(&Envelope::Response {
        nonce: Some(nonce.to_string()),
        error: Some(error.to_string()),
    })
}

pub fn encode_message(topic: &str, message: &str) -> String {
    encode(&Envelope::Message {
        data: MessageData {
            topic: topic.to_string(),
            message: message.to_string(),
        },
    })
}

pub fn encode_reconnect() -> String {
    encode(&Envelope::Reconnect)
}

/// Decode a text frame into an envelope
pub fn decode(text: &str) -> Result<Envelope> {
    serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(120).collect();
        PubSubError::MalformedMessage(format!("{} in frame {}", e, preview))
    })
}
