use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::pubsub::{PubSubError, Result};

pub const DEFAULT_PUBSUB_URL: &str = "wss://pubsub-edge.twitch.tv";
pub const CONFIG_FILE_NAME: &str = "pubsub.toml";

/// Tunables for the PubSub client
///
/// Every field has a default, so a config file only needs the values it changes.
/// Timings that tests shrink below a second are kept in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PubSubConfig {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub send_timeout_ms: u64,
    /// Twitch asks for a PING at least every five minutes
    pub ping_interval_ms: u64,
    pub pong_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub max_subscribe_retries: u32,
    pub subscribe_retry_delay_ms: u64,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub max_topics_per_request: usize,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PUBSUB_URL.to_string(),
            connect_timeout_ms: 10_000,
            send_timeout_ms: 10_000,
            ping_interval_ms: 4 * 60 * 1000,
            pong_timeout_ms: 10_000,
            response_timeout_ms: 10_000,
            max_subscribe_retries: 3,
            subscribe_retry_delay_ms: 1_000,
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 120_000,
            max_topics_per_request: 50,
        }
    }
}

impl PubSubConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PubSubError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PubSubConfig =
            toml::from_str(content).map_err(|e| PubSubError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `pubsub.toml` from the project root, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let project_root = project_root::get_project_root()
            .map_err(|e| PubSubError::ConfigError(format!("Project root not found: {}", e)))?;
        let config_path = project_root.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            log::info!("No {} found, using default settings", CONFIG_FILE_NAME);
            return Ok(Self::default());
        }

        Self::from_file(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(PubSubError::ConfigError("url must not be empty".to_string()));
        }
        if self.max_topics_per_request == 0 {
            return Err(PubSubError::ConfigError(
                "max_topics_per_request must be at least 1".to_string(),
            ));
        }
        if self.reconnect_base_delay_ms > self.reconnect_max_delay_ms {
            return Err(PubSubError::ConfigError(format!(
                "reconnect_base_delay_ms ({}) exceeds reconnect_max_delay_ms ({})",
                self.reconnect_base_delay_ms, self.reconnect_max_delay_ms
            )));
        }
        if self.ping_interval_ms == 0 || self.pong_timeout_ms == 0 {
            return Err(PubSubError::ConfigError(
                "keepalive timings must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn subscribe_retry_delay(&self) -> Duration {
        Duration::from_millis(self.subscribe_retry_delay_ms)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PubSubConfig::from_toml(
            r#"
            url = "ws://127.0.0.1:9000"
            max_subscribe_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.url, "ws://127.0.0.1:9000");
        assert_eq!(config.max_subscribe_retries, 5);
        assert_eq!(config.max_topics_per_request, 50);
        assert_eq!(config.ping_interval(), Duration::from_secs(240));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PubSubConfig::from_toml("max_topics_per_request = 0").is_err());
        assert!(PubSubConfig::from_toml(
            "reconnect_base_delay_ms = 5000\nreconnect_max_delay_ms = 10"
        )
        .is_err());
        assert!(PubSubConfig::from_toml("url = 3").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = PubSubConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(PubSubConfig::from_toml(&text).unwrap(), config);
    }
}
