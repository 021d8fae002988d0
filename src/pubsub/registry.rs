use std::collections::HashMap;
use std::sync::Arc;

use super::handler::EventHandler;
use super::topics::Topic;

/// Subscription status of a registered topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicStatus {
    /// LISTEN requested (or waiting for a connection), not yet acknowledged
    Pending,
    /// Acknowledged by the server on the current connection
    Active,
    /// UNLISTEN sent, waiting for the acknowledgement
    Unlistening,
    /// Server rejected the LISTEN after all retries
    Failed,
}

pub(crate) struct TopicEntry {
    pub topic: Topic,
    pub status: TopicStatus,
    pub handler: Arc<dyn EventHandler>,
}

/// Topic name → handler and status. Callers serialize access.
#[derive(Default)]
pub(crate) struct TopicRegistry {
    entries: HashMap<String, TopicEntry>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the handler for `topic`
    ///
    /// The status becomes Pending unless the topic is already Active.
    /// Returns the previous status, `None` for a new entry.
    pub fn register(&mut self, topic: Topic, handler: Arc<dyn EventHandler>) -> Option<TopicStatus> {
        match self.entries.get_mut(topic.as_str()) {
            Some(entry) => {
                let previous = entry.status;
                entry.handler = handler;
                if previous != TopicStatus::Active {
                    entry.status = TopicStatus::Pending;
                }
                Some(previous)
            }
            None => {
                self.entries.insert(
                    topic.as_str().to_string(),
                    TopicEntry {
                        topic,
                        status: TopicStatus::Pending,
                        handler,
                    },
                );
                None
            }
        }
    }

    pub fn unregister(&mut self, topic: &str) -> Option<TopicEntry> {
        self.entries.remove(topic)
    }

    pub fn status(&self, topic: &str) -> Option<TopicStatus> {
        self.entries.get(topic).map(|entry| entry.status)
    }

    pub fn set_status(&mut self, topic: &str, status: TopicStatus) -> bool {
        match self.entries.get_mut(topic) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    /// Entry for `topic`, `None` for topics never registered (or already removed)
    pub fn get(&self, topic: &str) -> Option<&TopicEntry> {
        self.entries.get(topic)
    }

    /// All registered topics, sorted by name so re-sync batches are stable
    pub fn list_all(&self) -> Vec<(Topic, TopicStatus)> {
        let mut topics: Vec<_> = self
            .entries
            .values()
            .map(|entry| (entry.topic.clone(), entry.status))
            .collect();
        topics.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        topics
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
