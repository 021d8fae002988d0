/// Twitch PubSub WebSocket client
///
/// This module keeps one WebSocket open to Twitch PubSub and multiplexes topic
/// subscriptions over it. It supports:
/// - LISTEN/UNLISTEN with nonce-matched responses and bounded retries
/// - Typed events for channel points, bits, bits badges and subscriptions
/// - PING/PONG keepalive with stale connection detection
/// - Automatic reconnection with exponential backoff and topic re-sync
///
/// # Example Usage
///
/// ```rust,no_run
/// use twitch_pubsub::config::PubSubConfig;
/// use twitch_pubsub::pubsub::{handler_fn, PubSubClient, StaticToken, TopicKind};
///
/// #[tokio::main]
/// async fn main() {
///     let client = PubSubClient::new(PubSubConfig::default(), StaticToken::new("oauth_token"));
///
///     client
///         .listen(
///             TopicKind::ChannelPoints,
///             "12345",
///             handler_fn(|topic, event| println!("{}: {:?}", topic, event)),
///         )
///         .await
///         .unwrap();
///
///     // Queued topics are subscribed as soon as the socket is up
///     client.connect().await.unwrap();
///
///     tokio::signal::ctrl_c().await.unwrap();
///     client.close().await;
/// }
/// ```

mod client;
pub mod codec;
mod connection;
mod coordinator;
mod dispatch;
mod error;
mod events;
mod handler;
mod keepalive;
mod reconnect;
mod registry;
mod token;
mod topics;

#[cfg(test)]
mod mock_upstream;

// Re-export public types
pub use client::PubSubClient;
pub use codec::Envelope;
pub use connection::ConnectionState;
pub use error::{PubSubError, Result};
pub use events::{
    decode_event, BadgeEntitlement, BitsBadgeEvent, BitsData, BitsEvent, ChannelPointsData,
    ChannelPointsEvent, MaxPerStream, PubSubEvent, Redemption, RedemptionReward,
    RedemptionUser, RewardImage, SubEmote, SubMessage, SubscriptionEvent,
};
pub use handler::{event_channel, handler_fn, ChannelHandler, EventHandler, EventStream, FnHandler};
pub use reconnect::Backoff;
pub use registry::TopicStatus;
pub use token::{SharedToken, StaticToken, TokenSource};
pub use topics::{Topic, TopicKind};
