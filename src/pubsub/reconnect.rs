use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};

use super::codec::Envelope;
use super::connection::{ConnectionManager, Inbound};
use super::coordinator::SubscriptionCoordinator;
use super::error::PubSubError;
use super::keepalive::KeepaliveMonitor;
use crate::config::PubSubConfig;

/// Exponential reconnect delay, doubling from `base` up to `max`
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Sole consumer of connection traffic and the only task that reconnects
///
/// Everything arriving from a connection other than the current one is ignored,
/// which also coalesces a second loss signal while a reconnect is under way.
pub(crate) struct Supervisor {
    connection: ConnectionManager,
    coordinator: SubscriptionCoordinator,
    config: Arc<PubSubConfig>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    shutdown: watch::Receiver<bool>,
    epoch: u64,
    keepalive: Option<KeepaliveMonitor>,
}

impl Supervisor {
    pub fn new(
        connection: ConnectionManager,
        coordinator: SubscriptionCoordinator,
        config: Arc<PubSubConfig>,
        inbound: (mpsc::UnboundedSender<Inbound>, mpsc::UnboundedReceiver<Inbound>),
        shutdown: watch::Receiver<bool>,
        epoch: u64,
    ) -> Self {
        let (inbound_tx, inbound) = inbound;
        Self {
            connection,
            coordinator,
            config,
            inbound_tx,
            inbound,
            shutdown,
            epoch,
            keepalive: None,
        }
    }

    pub async fn run(mut self) {
        if *self.shutdown.borrow() {
            return;
        }
        self.start_keepalive();

        loop {
            let item = tokio::select! {
                _ = self.shutdown.changed() => break,
                item = self.inbound.recv() => item,
            };
            let Some(item) = item else {
                break;
            };

            let lost = match item {
                Inbound::Frame { epoch, envelope } if epoch == self.epoch => {
                    self.route(envelope).await
                }
                Inbound::Closed { epoch, reason } if epoch == self.epoch => Some(reason),
                Inbound::Stale { epoch } if epoch == self.epoch => {
                    Some(PubSubError::StaleConnection.to_string())
                }
                other => {
                    log::trace!("Ignoring {:?} from a replaced connection", other);
                    None
                }
            };

            if let Some(reason) = lost {
                if !self.reconnect(&reason).await {
                    break;
                }
            }
        }

        self.stop_keepalive();
        log::debug!("Reconnect supervisor stopped");
    }

    /// Hand a frame to its consumer; returns a reason when the server wants us gone
    async fn route(&mut self, envelope: Envelope) -> Option<String> {
        match &envelope {
            Envelope::Response { nonce, .. } => {
                self.coordinator
                    .handle_response(nonce.as_deref(), envelope.response_error())
                    .await;
            }
            Envelope::Message { data } => {
                self.coordinator
                    .handle_message(&data.topic, &data.message)
                    .await;
            }
            Envelope::Pong => {
                if let Some(keepalive) = &self.keepalive {
                    keepalive.pong_received();
                }
            }
            Envelope::Reconnect => {
                return Some("server requested reconnect".to_string());
            }
            other => {
                log::debug!("Unexpected {} frame from server", other.type_name());
            }
        }
        None
    }

    /// Tear down and reconnect until it works; false once shut down
    async fn reconnect(&mut self, reason: &str) -> bool {
        log::warn!("Reconnecting: {}", reason);

        self.stop_keepalive();
        self.connection.close().await;
        self.coordinator.on_disconnected().await;

        let mut backoff = Backoff::new(
            self.config.reconnect_base_delay(),
            self.config.reconnect_max_delay(),
        );

        loop {
            let delay = backoff.next_delay();
            log::info!("Reconnect attempt {} in {:?}", backoff.attempts(), delay);

            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.shutdown.changed() => return false,
            }

            let attempt = tokio::select! {
                result = self.connection.connect(
                    &self.config.url,
                    self.config.connect_timeout(),
                    self.inbound_tx.clone(),
                ) => result,
                _ = self.shutdown.changed() => return false,
            };

            match attempt {
                Ok(epoch) => {
                    self.epoch = epoch;
                    self.coordinator.on_connected().await;
                    self.start_keepalive();
                    log::info!("✓ Reconnected after {} attempt(s)", backoff.attempts());
                    return true;
                }
                Err(e) => log::error!("Reconnection failed: {}", e),
            }
        }
    }

    fn start_keepalive(&mut self) {
        self.stop_keepalive();
        self.keepalive = Some(KeepaliveMonitor::start(
            self.connection.clone(),
            self.epoch,
            self.config.ping_interval(),
            self.config.pong_timeout(),
            self.inbound_tx.clone(),
        ));
    }

    fn stop_keepalive(&mut self) {
        if let Some(keepalive) = self.keepalive.take() {
            keepalive.stop();
        }
    }
}
