use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{PubSubError, Result};
use super::topics::TopicKind;

/// Channel points event (`channel-points-channel-v1`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelPointsEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: ChannelPointsData,
}

/// Time the reward was redeemed and the redemption itself
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelPointsData {
    pub timestamp: DateTime<Utc>,
    pub redemption: Redemption,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Redemption {
    pub id: String,
    pub user: RedemptionUser,
    pub channel_id: String,
    pub redeemed_at: DateTime<Utc>,
    pub reward: RedemptionReward,
    #[serde(default)]
    pub user_input: Option<String>,
    pub status: String,
}

/// User who redeemed the reward
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedemptionUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedemptionReward {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub cost: u64,
    #[serde(default)]
    pub is_user_input_required: bool,
    #[serde(default)]
    pub is_sub_only: bool,
    #[serde(default)]
    pub image: Option<RewardImage>,
    #[serde(default)]
    pub default_image: Option<RewardImage>,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub is_in_stock: bool,
    #[serde(default)]
    pub max_per_stream: Option<MaxPerStream>,
    #[serde(default)]
    pub should_redemptions_skip_request_queue: bool,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub updated_for_indicator_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewardImage {
    pub url_1x: String,
    pub url_2x: String,
    pub url_4x: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MaxPerStream {
    pub is_enabled: bool,
    pub max_per_stream: u64,
}

/// Bits event (`channel-bits-events-v2`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BitsEvent {
    pub data: BitsData,
    pub version: String,
    pub message_type: String,
    pub message_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BitsData {
    /// Absent for anonymous cheers
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub channel_name: String,
    pub channel_id: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub chat_message: String,
    pub bits_used: u64,
    pub total_bits_used: u64,
    #[serde(default)]
    pub is_anonymous: bool,
    pub context: String,
    #[serde(default)]
    pub badge_entitlement: Option<BadgeEntitlement>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BadgeEntitlement {
    pub new_version: u64,
    pub previous_version: u64,
}

/// Bits badge unlock (`channel-bits-badge-unlocks`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BitsBadgeEvent {
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub channel_name: String,
    pub badge_tier: u64,
    #[serde(default)]
    pub chat_message: Option<String>,
    pub time: DateTime<Utc>,
}

/// Subscription event (`channel-subscribe-events-v1`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionEvent {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub channel_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub channel_id: String,
    pub time: DateTime<Utc>,
    pub sub_plan: String,
    #[serde(default)]
    pub sub_plan_name: String,
    #[serde(default)]
    pub cumulative_months: Option<u32>,
    #[serde(default)]
    pub streak_months: Option<u32>,
    #[serde(default)]
    pub months: Option<u32>,
    pub context: String,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(default)]
    pub sub_message: Option<SubMessage>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient_user_name: Option<String>,
    #[serde(default)]
    pub recipient_display_name: Option<String>,
    #[serde(default)]
    pub multi_month_duration: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubMessage {
    pub message: String,
    #[serde(default)]
    pub emotes: Option<Vec<SubEmote>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubEmote {
    pub start: u32,
    pub end: u32,
    pub id: u64,
}

/// Events that can be received from Twitch PubSub
#[derive(Debug, Clone)]
pub enum PubSubEvent {
    ChannelPoints(ChannelPointsEvent),
    Bits(BitsEvent),
    BitsBadge(BitsBadgeEvent),
    Subscription(SubscriptionEvent),
}

impl PubSubEvent {
    pub fn kind(&self) -> TopicKind {
        match self {
            PubSubEvent::ChannelPoints(_) => TopicKind::ChannelPoints,
            PubSubEvent::Bits(_) => TopicKind::ChannelBits,
            PubSubEvent::BitsBadge(_) => TopicKind::ChannelBitsBadge,
            PubSubEvent::Subscription(_) => TopicKind::ChannelSubscriptions,
        }
    }
}

/// Parse the inner `message` string of a MESSAGE frame for the given topic kind
pub fn decode_event(kind: TopicKind, message: &str) -> Result<PubSubEvent> {
    let malformed = |e: serde_json::Error| {
        PubSubError::MalformedMessage(format!("{} payload: {}", kind, e))
    };

    match kind {
        TopicKind::ChannelPoints => serde_json::from_str(message)
            .map(PubSubEvent::ChannelPoints)
            .map_err(malformed),
        TopicKind::ChannelBits => serde_json::from_str(message)
            .map(PubSubEvent::Bits)
            .map_err(malformed),
        TopicKind::ChannelBitsBadge => serde_json::from_str(message)
            .map(PubSubEvent::BitsBadge)
            .map_err(malformed),
        TopicKind::ChannelSubscriptions => serde_json::from_str(message)
            .map(PubSubEvent::Subscription)
            .map_err(malformed),
    }
}
