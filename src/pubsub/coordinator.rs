use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::codec;
use super::connection::ConnectionManager;
use super::dispatch::{Delivery, Dispatcher};
use super::error::{PubSubError, Result};
use super::events::decode_event;
use super::handler::EventHandler;
use super::registry::{TopicRegistry, TopicStatus};
use super::token::TokenSource;
use super::topics::Topic;
use crate::config::PubSubConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Listen,
    Unlisten,
}

/// A LISTEN/UNLISTEN waiting for its RESPONSE
#[derive(Debug)]
struct PendingRequest {
    kind: RequestKind,
    topics: Vec<String>,
    issued_at: Instant,
    retries: u32,
}

struct CoordinatorState {
    registry: TopicRegistry,
    pending: HashMap<String, PendingRequest>,
    dispatcher: Dispatcher,
    /// Connected and re-synced; requests go straight out
    online: bool,
    /// Bumped on every connect so retries from an earlier connection are dropped
    session: u64,
    closed: bool,
}

impl CoordinatorState {
    fn remove_topic(&mut self, topic: &str) {
        if self.registry.unregister(topic).is_some() {
            self.dispatcher.retire(topic);
        }
    }
}

struct Inner {
    state: Mutex<CoordinatorState>,
    connection: ConnectionManager,
    tokens: Arc<dyn TokenSource>,
    config: Arc<PubSubConfig>,
    nonce_prefix: String,
    next_nonce: AtomicU64,
}

/// Owns the topic registry and every in-flight LISTEN/UNLISTEN
///
/// All state sits behind one mutex, so a topic has exactly one status at any
/// instant no matter how many callers, timers and the inbound router race.
#[derive(Clone)]
pub(crate) struct SubscriptionCoordinator {
    inner: Arc<Inner>,
}

impl SubscriptionCoordinator {
    pub fn new(
        connection: ConnectionManager,
        tokens: Arc<dyn TokenSource>,
        config: Arc<PubSubConfig>,
    ) -> Self {
        let nonce_prefix = format!("{:x}", chrono::Utc::now().timestamp_micros());

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CoordinatorState {
                    registry: TopicRegistry::new(),
                    pending: HashMap::new(),
                    dispatcher: Dispatcher::new(),
                    online: false,
                    session: 0,
                    closed: false,
                }),
                connection,
                tokens,
                config,
                nonce_prefix,
                next_nonce: AtomicU64::new(0),
            }),
        }
    }

    /// Register `handler` for `topic` and subscribe when online
    pub async fn listen(&self, topic: Topic, handler: Arc<dyn EventHandler>) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(PubSubError::Closed);
        }

        let name = topic.as_str().to_string();
        let previous = state.registry.register(topic, handler);
        let needs_request = matches!(
            previous,
            None | Some(TopicStatus::Failed) | Some(TopicStatus::Unlistening)
        );

        if !needs_request {
            log::debug!("Handler for {} replaced ({:?})", name, previous);
        } else if state.online {
            self.send_request(&mut state, RequestKind::Listen, vec![name], 0);
        } else {
            log::debug!("{} queued until the connection is up", name);
        }

        Ok(())
    }

    /// Unsubscribe from `topic`; removal is immediate when offline
    pub async fn unlisten(&self, topic: &Topic) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(PubSubError::Closed);
        }

        let name = topic.as_str();
        let Some(status) = state.registry.status(name) else {
            log::debug!("Unlisten for unregistered topic {}", name);
            return Ok(());
        };

        match status {
            TopicStatus::Active | TopicStatus::Pending if state.online => {
                state.registry.set_status(name, TopicStatus::Unlistening);
                self.send_request(&mut state, RequestKind::Unlisten, vec![name.to_string()], 0);
            }
            TopicStatus::Unlistening if state.online => {}
            _ => {
                state.remove_topic(name);
                log::info!("Removed {}", name);
            }
        }

        Ok(())
    }

    /// Match a RESPONSE to its request
    ///
    /// `error` is the rejection reason as given by [`Envelope::response_error`],
    /// `None` for success.
    ///
    /// [`Envelope::response_error`]: super::codec::Envelope::response_error
    pub async fn handle_response(&self, nonce: Option<&str>, error: Option<&str>) {
        let Some(nonce) = nonce else {
            log::debug!("Ignoring RESPONSE without nonce");
            return;
        };

        let mut state = self.inner.state.lock().await;
        let Some(request) = state.pending.remove(nonce) else {
            log::debug!("Ignoring RESPONSE for unknown nonce {}", nonce);
            return;
        };

        log::trace!(
            "RESPONSE for {} after {:?}",
            nonce,
            request.issued_at.elapsed()
        );

        match error {
            None => Self::complete(&mut state, request),
            Some(reason) => self.fail_attempt(&mut state, request, reason),
        }
    }

    /// Route a MESSAGE payload to the topic's dispatch worker
    pub async fn handle_message(&self, topic: &str, message: &str) {
        let mut state = self.inner.state.lock().await;

        let Some(entry) = state.registry.get(topic) else {
            match Topic::parse(topic) {
                Some(_) => log::debug!("Dropping message for unregistered topic {}", topic),
                None => log::warn!("Dropping message for unrecognised topic {}", topic),
            }
            return;
        };
        if entry.status == TopicStatus::Unlistening {
            log::debug!("Dropping message for {} while unlistening", topic);
            return;
        }

        let topic = entry.topic.clone();
        let handler = entry.handler.clone();
        match decode_event(topic.kind(), message) {
            Ok(event) => state
                .dispatcher
                .dispatch(&topic, handler, Delivery::Event(event)),
            Err(e) => log::warn!("Dropping message for {}: {}", topic, e),
        }
    }

    /// A fresh connection is up: drop stale requests and re-send every topic
    pub async fn on_connected(&self) {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return;
        }

        state.pending.clear();
        state.session += 1;
        state.online = true;

        if state.registry.is_empty() {
            return;
        }
        log::debug!(
            "Connection {} up with {} registered topic(s)",
            state.session,
            state.registry.len()
        );

        let mut topics = Vec::new();
        for (topic, status) in state.registry.list_all() {
            if status == TopicStatus::Unlistening {
                state.remove_topic(topic.as_str());
            } else {
                state.registry.set_status(topic.as_str(), TopicStatus::Pending);
                topics.push(topic.as_str().to_string());
            }
        }

        if topics.is_empty() {
            return;
        }

        log::info!("Re-syncing {} topic(s)", topics.len());
        self.send_request(&mut state, RequestKind::Listen, topics, 0);
    }

    /// The connection is gone: nothing is Active and nothing is in flight
    pub async fn on_disconnected(&self) {
        let mut state = self.inner.state.lock().await;
        self.go_offline(&mut state);
    }

    pub async fn on_closed(&self) {
        let mut state = self.inner.state.lock().await;
        self.go_offline(&mut state);
        state.closed = true;
        state.dispatcher.shutdown();
    }

    pub async fn topic_status(&self, topic: &str) -> Option<TopicStatus> {
        self.inner.state.lock().await.registry.status(topic)
    }

    pub async fn topics(&self) -> Vec<(Topic, TopicStatus)> {
        self.inner.state.lock().await.registry.list_all()
    }

    #[cfg(test)]
    async fn pending_count(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    fn go_offline(&self, state: &mut CoordinatorState) {
        if state.online || !state.pending.is_empty() {
            log::debug!(
                "Going offline, discarding {} pending request(s)",
                state.pending.len()
            );
        }
        state.online = false;
        state.pending.clear();

        for (topic, status) in state.registry.list_all() {
            match status {
                TopicStatus::Active => {
                    state.registry.set_status(topic.as_str(), TopicStatus::Pending);
                }
                TopicStatus::Unlistening => state.remove_topic(topic.as_str()),
                TopicStatus::Pending | TopicStatus::Failed => {}
            }
        }
    }

    fn complete(state: &mut CoordinatorState, request: PendingRequest) {
        for topic in &request.topics {
            match (request.kind, state.registry.status(topic)) {
                (RequestKind::Listen, Some(TopicStatus::Pending)) => {
                    state.registry.set_status(topic, TopicStatus::Active);
                    log::info!("✓ Listening to {}", topic);
                }
                (RequestKind::Unlisten, Some(TopicStatus::Unlistening)) => {
                    state.remove_topic(topic);
                    log::info!("✓ Unlistened from {}", topic);
                }
                (kind, status) => {
                    log::debug!("Late {:?} ack for {} ({:?}), ignoring", kind, topic, status);
                }
            }
        }
    }

    fn fail_attempt(&self, state: &mut CoordinatorState, request: PendingRequest, reason: &str) {
        let retries = request.retries + 1;
        let max_retries = self.inner.config.max_subscribe_retries;

        if retries <= max_retries {
            log::warn!(
                "{:?} {:?} failed: {} (retry {}/{})",
                request.kind,
                request.topics,
                reason,
                retries,
                max_retries
            );
            self.schedule_retry(request.kind, request.topics, retries, state.session);
            return;
        }

        log::error!(
            "✗ {:?} {:?} failed after {} retries: {}",
            request.kind,
            request.topics,
            max_retries,
            reason
        );

        for name in &request.topics {
            let expected = match request.kind {
                RequestKind::Listen => TopicStatus::Pending,
                RequestKind::Unlisten => TopicStatus::Unlistening,
            };
            let Some(entry) = state.registry.get(name) else {
                continue;
            };
            if entry.status != expected {
                continue;
            }

            let topic = entry.topic.clone();
            let handler = entry.handler.clone();
            let error = PubSubError::SubscriptionFailed {
                topic: name.clone(),
                reason: reason.to_string(),
            };
            state
                .dispatcher
                .dispatch(&topic, handler, Delivery::Failure(error));

            match request.kind {
                RequestKind::Listen => {
                    state.registry.set_status(name, TopicStatus::Failed);
                }
                RequestKind::Unlisten => state.remove_topic(name),
            }
        }
    }

    fn schedule_retry(&self, kind: RequestKind, topics: Vec<String>, retries: u32, session: u64) {
        let this = self.clone();
        let delay = self.inner.config.subscribe_retry_delay();

        tokio::spawn(async move {
            sleep(delay).await;

            let mut state = this.inner.state.lock().await;
            if !state.online || state.session != session {
                return;
            }

            let expected = match kind {
                RequestKind::Listen => TopicStatus::Pending,
                RequestKind::Unlisten => TopicStatus::Unlistening,
            };
            let topics: Vec<String> = topics
                .into_iter()
                .filter(|topic| state.registry.status(topic) == Some(expected))
                .collect();

            if !topics.is_empty() {
                this.send_request(&mut state, kind, topics, retries);
            }
        });
    }

    /// Send `topics` in batches, each with its own nonce and response deadline
    fn send_request(
        &self,
        state: &mut CoordinatorState,
        kind: RequestKind,
        topics: Vec<String>,
        retries: u32,
    ) {
        let batch_size = self.inner.config.max_topics_per_request.max(1);

        for batch in topics.chunks(batch_size) {
            let nonce = self.next_nonce();
            let text = match kind {
                RequestKind::Listen => {
                    codec::encode_listen(&nonce, batch, &self.inner.tokens.current_token())
                }
                RequestKind::Unlisten => codec::encode_unlisten(&nonce, batch),
            };

            if let Err(e) = self.inner.connection.send(text) {
                log::warn!("Could not send {:?} for {:?}: {}", kind, batch, e);
                continue;
            }
            log::debug!("{:?} {:?} sent (nonce {})", kind, batch, nonce);

            state.pending.insert(
                nonce.clone(),
                PendingRequest {
                    kind,
                    topics: batch.to_vec(),
                    issued_at: Instant::now(),
                    retries,
                },
            );
            self.arm_response_timeout(nonce);
        }
    }

    fn arm_response_timeout(&self, nonce: String) {
        let this = self.clone();
        let deadline = self.inner.config.response_timeout();

        tokio::spawn(async move {
            sleep(deadline).await;

            let mut state = this.inner.state.lock().await;
            if let Some(request) = state.pending.remove(&nonce) {
                this.fail_attempt(&mut state, request, "response timed out");
            }
        });
    }

    fn next_nonce(&self) -> String {
        let n = self.inner.next_nonce.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.inner.nonce_prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::codec::Envelope;
    use crate::pubsub::connection::Inbound;
    use crate::pubsub::events::{fixtures, PubSubEvent};
    use crate::pubsub::handler::{event_channel, handler_fn, EventStream};
    use crate::pubsub::mock_upstream::MockUpstream;
    use crate::pubsub::token::StaticToken;
    use crate::pubsub::topics::TopicKind;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_stream::StreamExt;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn test_config() -> PubSubConfig {
        PubSubConfig {
            max_subscribe_retries: 2,
            subscribe_retry_delay_ms: 10,
            response_timeout_ms: 5_000,
            ..PubSubConfig::default()
        }
    }

    async fn setup(config: PubSubConfig) -> (MockUpstream, ConnectionManager, SubscriptionCoordinator) {
        let upstream = MockUpstream::start().await;
        upstream.set_auto_ack(false);
        let connection = ConnectionManager::new(TIMEOUT);
        let coordinator = SubscriptionCoordinator::new(
            connection.clone(),
            Arc::new(StaticToken::new("token")),
            Arc::new(config),
        );
        (upstream, connection, coordinator)
    }

    /// The returned receiver must stay alive; these tests drive the coordinator directly
    async fn connect(
        upstream: &MockUpstream,
        connection: &ConnectionManager,
    ) -> mpsc::UnboundedReceiver<Inbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        connection.connect(&upstream.url(), TIMEOUT, tx).await.unwrap();
        rx
    }

    fn points(scope: &str) -> Topic {
        Topic::new(TopicKind::ChannelPoints, scope).unwrap()
    }

    fn noop() -> Arc<dyn EventHandler> {
        Arc::new(handler_fn(|_, _: PubSubEvent| {}))
    }

    async fn next_listen(upstream: &MockUpstream) -> (String, Vec<String>) {
        match upstream.next_frame().await.1 {
            Envelope::Listen { nonce, data } => {
                assert_eq!(data.auth_token, "token");
                (nonce, data.topics)
            }
            other => panic!("expected LISTEN, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_offline_listens_sent_once_in_batches() {
        let config = PubSubConfig {
            max_topics_per_request: 2,
            ..test_config()
        };
        let (upstream, connection, coordinator) = setup(config).await;

        for scope in ["1", "2", "3", "4", "5"] {
            coordinator.listen(points(scope), noop()).await.unwrap();
        }
        coordinator.unlisten(&points("4")).await.unwrap();
        coordinator.listen(points("2"), noop()).await.unwrap();
        assert!(upstream.try_next_frame().await.is_none());

        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (_, topics) = next_listen(&upstream).await;
            assert_eq!(topics.len(), 2);
            seen.extend(topics);
        }

        let expected: Vec<String> = ["1", "2", "3", "5"]
            .iter()
            .map(|s| points(s).as_str().to_string())
            .collect();
        assert_eq!(seen, expected);
        assert!(upstream.try_next_frame().await.is_none());
        assert_eq!(coordinator.pending_count().await, 2);
    }

    #[tokio::test]
    async fn test_ack_activates_and_unknown_nonce_is_ignored() {
        let (upstream, connection, coordinator) = setup(test_config()).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        coordinator.listen(points("1"), noop()).await.unwrap();
        let (nonce, _) = next_listen(&upstream).await;

        coordinator.handle_response(Some("bogus"), None).await;
        coordinator.handle_response(None, Some("ERR_BADAUTH")).await;
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Pending)
        );

        coordinator.handle_response(Some(&nonce), None).await;
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Active)
        );

        // A duplicate ack is just an unknown nonce now.
        coordinator.handle_response(Some(&nonce), Some("ERR_SERVER")).await;
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Active)
        );

        coordinator.on_disconnected().await;
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Pending)
        );
    }

    async fn expect_single_failure(stream: &mut EventStream) {
        match tokio::time::timeout(TIMEOUT, stream.next()).await {
            Ok(Some(Err(PubSubError::SubscriptionFailed { reason, .. }))) => {
                assert_eq!(reason, "ERR_BADAUTH");
            }
            _ => panic!("expected SubscriptionFailed"),
        }
        // Either nothing more arrives or the stream ends with the removed topic.
        let extra = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
        assert!(!matches!(extra, Ok(Some(_))), "failure reported more than once");
    }

    #[tokio::test]
    async fn test_failure_reported_once_after_retries() {
        let (upstream, connection, coordinator) = setup(test_config()).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        let (handler, mut stream) = event_channel();
        coordinator.listen(points("1"), Arc::new(handler)).await.unwrap();

        let mut nonces = HashSet::new();
        for attempt in 0..3 {
            let (nonce, topics) = next_listen(&upstream).await;
            assert_eq!(topics, vec![points("1").as_str().to_string()]);
            assert!(nonces.insert(nonce.clone()), "nonce reused");

            if attempt < 2 {
                assert_eq!(
                    coordinator.topic_status(points("1").as_str()).await,
                    Some(TopicStatus::Pending)
                );
            }
            coordinator.handle_response(Some(&nonce), Some("ERR_BADAUTH")).await;
        }

        expect_single_failure(&mut stream).await;
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Failed)
        );
        assert!(upstream.try_next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_response_timeout_counts_as_failure() {
        let config = PubSubConfig {
            max_subscribe_retries: 0,
            response_timeout_ms: 30,
            ..test_config()
        };
        let (upstream, connection, coordinator) = setup(config).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        let (handler, mut stream) = event_channel();
        coordinator.listen(points("1"), Arc::new(handler)).await.unwrap();
        next_listen(&upstream).await;

        match tokio::time::timeout(TIMEOUT, stream.next()).await {
            Ok(Some(Err(PubSubError::SubscriptionFailed { reason, .. }))) => {
                assert_eq!(reason, "response timed out");
            }
            _ => panic!("expected timeout failure"),
        }
        assert_eq!(coordinator.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_unlisten_online_waits_for_ack() {
        let (upstream, connection, coordinator) = setup(test_config()).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        coordinator.listen(points("1"), noop()).await.unwrap();
        let (nonce, _) = next_listen(&upstream).await;
        coordinator.handle_response(Some(&nonce), None).await;

        coordinator.unlisten(&points("1")).await.unwrap();
        let nonce = match upstream.next_frame().await.1 {
            Envelope::Unlisten { nonce, data } => {
                assert_eq!(data.topics, vec![points("1").as_str().to_string()]);
                nonce
            }
            other => panic!("expected UNLISTEN, got {:?}", other),
        };
        assert_eq!(
            coordinator.topic_status(points("1").as_str()).await,
            Some(TopicStatus::Unlistening)
        );

        coordinator.handle_response(Some(&nonce), None).await;
        assert_eq!(coordinator.topic_status(points("1").as_str()).await, None);
    }

    #[tokio::test]
    async fn test_failed_unlisten_removes_topic_and_reports_once() {
        let (upstream, connection, coordinator) = setup(test_config()).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        let (handler, mut stream) = event_channel();
        coordinator.listen(points("1"), Arc::new(handler)).await.unwrap();
        let (nonce, _) = next_listen(&upstream).await;
        coordinator.handle_response(Some(&nonce), None).await;

        coordinator.unlisten(&points("1")).await.unwrap();

        let mut nonces = HashSet::new();
        for _ in 0..3 {
            let nonce = match upstream.next_frame().await.1 {
                Envelope::Unlisten { nonce, data } => {
                    assert_eq!(data.topics, vec![points("1").as_str().to_string()]);
                    nonce
                }
                other => panic!("expected UNLISTEN, got {:?}", other),
            };
            assert!(nonces.insert(nonce.clone()), "nonce reused");
            assert_eq!(
                coordinator.topic_status(points("1").as_str()).await,
                Some(TopicStatus::Unlistening)
            );
            coordinator.handle_response(Some(&nonce), Some("ERR_BADAUTH")).await;
        }

        expect_single_failure(&mut stream).await;
        assert_eq!(coordinator.topic_status(points("1").as_str()).await, None);
        assert_eq!(coordinator.pending_count().await, 0);
        assert!(upstream.try_next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_unlisten_offline_removes_immediately() {
        let (upstream, _connection, coordinator) = setup(test_config()).await;
        coordinator.listen(points("1"), noop()).await.unwrap();
        coordinator.unlisten(&points("1")).await.unwrap();
        coordinator.unlisten(&points("never")).await.unwrap();

        assert!(coordinator.topics().await.is_empty());
        assert!(upstream.try_next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_messages_routed_by_topic() {
        let (_upstream, _connection, coordinator) = setup(test_config()).await;
        let bits = Topic::new(TopicKind::ChannelBits, "44322889").unwrap();
        let (handler, mut stream) = event_channel();
        coordinator.listen(bits.clone(), Arc::new(handler)).await.unwrap();

        coordinator
            .handle_message("channel-bits-events-v2.999", fixtures::BITS)
            .await;
        coordinator.handle_message("whispers.44322889", fixtures::BITS).await;
        coordinator.handle_message(bits.as_str(), "{not json").await;
        coordinator.handle_message(bits.as_str(), fixtures::BITS).await;

        match tokio::time::timeout(TIMEOUT, stream.next()).await {
            Ok(Some(Ok(PubSubEvent::Bits(event)))) => assert_eq!(event.data.bits_used, 10000),
            _ => panic!("expected bits event"),
        }
        let extra = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_listens_keep_registry_consistent() {
        let (upstream, connection, coordinator) = setup(test_config()).await;
        let _inbound = connect(&upstream, &connection).await;
        coordinator.on_connected().await;

        let mut tasks = Vec::new();
        for i in 0..20 {
            let coordinator = coordinator.clone();
            tasks.push(tokio::spawn(async move {
                coordinator.listen(points(&i.to_string()), noop()).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut nonces = HashSet::new();
        let mut topics = HashSet::new();
        for _ in 0..20 {
            let (nonce, batch) = next_listen(&upstream).await;
            assert!(nonces.insert(nonce.clone()));
            assert_eq!(batch.len(), 1);
            assert!(topics.insert(batch[0].clone()));
            coordinator.handle_response(Some(&nonce), None).await;
        }

        let registered = coordinator.topics().await;
        assert_eq!(registered.len(), 20);
        assert!(registered
            .iter()
            .all(|(_, status)| *status == TopicStatus::Active));
    }
}
