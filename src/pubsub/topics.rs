use std::fmt;

use super::error::{PubSubError, Result};

/// Kinds of PubSub topics this client knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Custom channel points reward redemptions
    ChannelPoints,
    /// Bits cheered in a channel
    ChannelBits,
    /// Bits badge tier unlocks
    ChannelBitsBadge,
    /// Subscriptions, resubscriptions and gifted subscriptions
    ChannelSubscriptions,
}

impl TopicKind {
    pub const ALL: [TopicKind; 4] = [
        TopicKind::ChannelPoints,
        TopicKind::ChannelBits,
        TopicKind::ChannelBitsBadge,
        TopicKind::ChannelSubscriptions,
    ];

    /// Topic name prefix used on the wire
    pub fn prefix(&self) -> &'static str {
        match self {
            TopicKind::ChannelPoints => "channel-points-channel-v1",
            TopicKind::ChannelBits => "channel-bits-events-v2",
            TopicKind::ChannelBitsBadge => "channel-bits-badge-unlocks",
            TopicKind::ChannelSubscriptions => "channel-subscribe-events-v1",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<TopicKind> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A topic scoped to a single entity, rendered as `<prefix>.<scope_id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    kind: TopicKind,
    scope_id: String,
    name: String,
}

impl Topic {
    pub fn new(kind: TopicKind, scope_id: impl Into<String>) -> Result<Self> {
        let scope_id = scope_id.into();
        if scope_id.trim().is_empty() {
            return Err(PubSubError::ConfigError(format!(
                "Empty scope id for topic kind {}",
                kind
            )));
        }

        let name = format!("{}.{}", kind.prefix(), scope_id);
        Ok(Self {
            kind,
            scope_id,
            name,
        })
    }

    /// Parse a full topic name as received in a MESSAGE frame
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, scope_id) = name.split_once('.')?;
        let kind = TopicKind::from_prefix(prefix)?;
        Topic::new(kind, scope_id).ok()
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
