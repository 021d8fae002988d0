use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::PubSubError;
use super::events::PubSubEvent;
use super::handler::EventHandler;
use super::topics::Topic;

pub(crate) enum Delivery {
    Event(PubSubEvent),
    Failure(PubSubError),
}

struct Job {
    handler: Arc<dyn EventHandler>,
    delivery: Delivery,
}

/// One FIFO worker per topic
///
/// Jobs for a topic run strictly in order; different topics run independently.
/// Handler calls happen on the blocking pool so a slow handler never holds up the
/// connection tasks.
#[derive(Default)]
pub(crate) struct Dispatcher {
    workers: HashMap<String, mpsc::UnboundedSender<Job>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, topic: &Topic, handler: Arc<dyn EventHandler>, delivery: Delivery) {
        let mut job = Job { handler, delivery };

        if let Some(tx) = self.workers.get(topic.as_str()) {
            match tx.send(job) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    log::warn!("Dispatch worker for {} exited, restarting", topic);
                    job = returned;
                }
            }
        }

        let tx = spawn_worker(topic.clone());
        if tx.send(job).is_err() {
            log::error!("Failed to hand event for {} to a fresh worker", topic);
        }
        self.workers.insert(topic.as_str().to_string(), tx);
    }

    /// Stop the worker for `topic` once it has drained its queue
    pub fn retire(&mut self, topic: &str) {
        self.workers.remove(topic);
    }

    pub fn shutdown(&mut self) {
        self.workers.clear();
    }

    #[cfg(test)]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn spawn_worker(topic: Topic) -> mpsc::UnboundedSender<Job> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let topic = topic.clone();
            let result = tokio::task::spawn_blocking(move || match job.delivery {
                Delivery::Event(event) => job.handler.on_event(&topic, event),
                Delivery::Failure(error) => job.handler.on_error(&topic, error),
            })
            .await;

            if let Err(e) = result {
                log::error!("Handler panicked: {}", e);
            }
        }
        log::trace!("Dispatch worker for {} stopped", topic);
    });

    tx
}
