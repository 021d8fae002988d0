use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::error::PubSubError;
use super::events::PubSubEvent;
use super::topics::Topic;

/// Receiver of decoded events for one topic
///
/// Calls for the same topic are made one at a time, in arrival order, on a
/// blocking-capable worker thread.
pub trait EventHandler: Send + Sync + 'static {
    fn on_event(&self, topic: &Topic, event: PubSubEvent);

    /// Called once when a subscription is given up on
    fn on_error(&self, topic: &Topic, error: PubSubError) {
        log::error!("Unhandled error for topic {}: {}", topic, error);
    }
}

/// Adapter turning a closure into an [`EventHandler`]
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Topic, PubSubEvent) + Send + Sync + 'static,
{
    FnHandler(f)
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&Topic, PubSubEvent) + Send + Sync + 'static,
{
    fn on_event(&self, topic: &Topic, event: PubSubEvent) {
        (self.0)(topic, event)
    }
}

/// Stream of events (and the terminal subscription error, if any) for one topic
pub type EventStream = UnboundedReceiverStream<Result<PubSubEvent, PubSubError>>;

/// Handler forwarding everything into an [`EventStream`]
#[derive(Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<Result<PubSubEvent, PubSubError>>,
}

pub fn event_channel() -> (ChannelHandler, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelHandler { tx }, UnboundedReceiverStream::new(rx))
}

impl EventHandler for ChannelHandler {
    fn on_event(&self, topic: &Topic, event: PubSubEvent) {
        if self.tx.send(Ok(event)).is_err() {
            log::debug!("Event stream for {} dropped, discarding event", topic);
        }
    }

    fn on_error(&self, topic: &Topic, error: PubSubError) {
        if self.tx.send(Err(error)).is_err() {
            log::debug!("Event stream for {} dropped, discarding error", topic);
        }
    }
}
