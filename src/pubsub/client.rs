use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::connection::{ConnectionManager, ConnectionState};
use super::coordinator::SubscriptionCoordinator;
use super::error::{PubSubError, Result};
use super::handler::{event_channel, EventHandler, EventStream};
use super::reconnect::Supervisor;
use super::registry::TopicStatus;
use super::token::TokenSource;
use super::topics::{Topic, TopicKind};
use crate::config::PubSubConfig;

/// Twitch PubSub client
///
/// Topics can be registered before or after [`connect`](Self::connect). Once
/// connected the client keeps itself connected, re-subscribing everything after
/// each reconnect, until [`close`](Self::close) is called.
pub struct PubSubClient {
    config: Arc<PubSubConfig>,
    connection: ConnectionManager,
    coordinator: SubscriptionCoordinator,
    shutdown: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PubSubClient {
    pub fn new<T: TokenSource>(config: PubSubConfig, tokens: T) -> Self {
        let config = Arc::new(config);
        let connection = ConnectionManager::new(config.send_timeout());
        let coordinator =
            SubscriptionCoordinator::new(connection.clone(), Arc::new(tokens), config.clone());
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            connection,
            coordinator,
            shutdown,
            supervisor: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Open the connection and start supervising it
    ///
    /// Only the first attempt is reported here. Later losses are retried in the
    /// background without limit. A [`close`](Self::close) during the attempt
    /// cancels it and yields [`PubSubError::Closed`].
    pub async fn connect(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PubSubError::Closed);
        }

        let mut supervisor = self.supervisor.lock().await;
        if supervisor.as_ref().is_some_and(|task| !task.is_finished()) {
            log::debug!("Already connected");
            return Ok(());
        }

        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(PubSubError::Closed);
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let epoch = tokio::select! {
            result = self.connection.connect(
                &self.config.url,
                self.config.connect_timeout(),
                inbound_tx.clone(),
            ) => result?,
            _ = shutdown.changed() => {
                log::info!("Connect attempt cancelled by close");
                return Err(PubSubError::Closed);
            }
        };
        self.coordinator.on_connected().await;

        let runner = Supervisor::new(
            self.connection.clone(),
            self.coordinator.clone(),
            self.config.clone(),
            (inbound_tx, inbound_rx),
            shutdown,
            epoch,
        );
        *supervisor = Some(tokio::spawn(runner.run()));

        log::info!("✓ Connected to Twitch PubSub");
        Ok(())
    }

    /// Shut the client down for good
    ///
    /// Cancels any connect or reconnect in flight, stops the keepalive and closes
    /// the socket.
    /// Calling it again is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("Closing PubSub client");

        self.shutdown.send_replace(true);

        if let Some(mut task) = self.supervisor.lock().await.take() {
            if timeout(self.config.send_timeout(), &mut task).await.is_err() {
                log::warn!("Supervisor did not stop in time, aborting it");
                task.abort();
            }
        }

        self.connection.close().await;
        self.coordinator.on_closed().await;
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Subscribe `handler` to a topic
    ///
    /// Returns once the request is sent (or queued while offline). A rejection
    /// arrives later through [`EventHandler::on_error`].
    pub async fn listen<H: EventHandler>(
        &self,
        kind: TopicKind,
        scope_id: &str,
        handler: H,
    ) -> Result<Topic> {
        self.listen_shared(kind, scope_id, Arc::new(handler)).await
    }

    /// Like [`listen`](Self::listen) for a handler shared between topics
    pub async fn listen_shared(
        &self,
        kind: TopicKind,
        scope_id: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Topic> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PubSubError::Closed);
        }

        let topic = Topic::new(kind, scope_id)?;
        self.coordinator.listen(topic.clone(), handler).await?;
        Ok(topic)
    }

    /// Subscribe and receive events as a stream instead of callbacks
    pub async fn listen_stream(&self, kind: TopicKind, scope_id: &str) -> Result<EventStream> {
        let (handler, stream) = event_channel();
        self.listen(kind, scope_id, handler).await?;
        Ok(stream)
    }

    pub async fn unlisten(&self, kind: TopicKind, scope_id: &str) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PubSubError::Closed);
        }

        let topic = Topic::new(kind, scope_id)?;
        self.coordinator.unlisten(&topic).await
    }

    pub async fn topic_status(&self, kind: TopicKind, scope_id: &str) -> Option<TopicStatus> {
        let topic = Topic::new(kind, scope_id).ok()?;
        self.coordinator.topic_status(topic.as_str()).await
    }

    /// Every registered topic with its status, sorted by name
    pub async fn topics(&self) -> Vec<(Topic, TopicStatus)> {
        self.coordinator.topics().await
    }
}
