//! In-process queue broker
//!
//! Mirrors the Redis list discipline (push left, pop right) without an
//! external endpoint. Clones share the same channels, so a test can play the
//! game server against a controller that owns another clone.

use crate::broker::{Delivery, QueueBroker};
use async_trait::async_trait;
use lol_rl_core::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Default)]
struct Inner {
    queues: Mutex<HashMap<String, VecDeque<String>>>,
    /// Every push and clear, in order, for inspection
    journal: Mutex<Vec<JournalEntry>>,
    notify: Notify,
}

/// Operation recorded by [`MemoryBroker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Push { channel: String, message: String },
    Clear { channel: String },
}

#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending messages on a channel, oldest first
    pub fn pending(&self, channel: &str) -> Vec<String> {
        lock(&self.inner.queues)
            .get(channel)
            .map(|q| q.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove and return all pending messages on a channel, oldest first
    pub fn drain(&self, channel: &str) -> Vec<String> {
        lock(&self.inner.queues)
            .remove(channel)
            .map(|q| q.into_iter().rev().collect())
            .unwrap_or_default()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        lock(&self.inner.journal).clone()
    }

    fn try_pop(&self, channel: &str) -> Option<String> {
        lock(&self.inner.queues)
            .get_mut(channel)
            .and_then(VecDeque::pop_back)
    }
}

#[async_trait]
impl QueueBroker for MemoryBroker {
    async fn push(&self, channel: &str, message: &str) -> Result<()> {
        self.push_all(channel, &[message.to_string()]).await
    }

    async fn push_all(&self, channel: &str, messages: &[String]) -> Result<()> {
        {
            let mut queues = lock(&self.inner.queues);
            let queue = queues.entry(channel.to_string()).or_default();
            let mut journal = lock(&self.inner.journal);
            for message in messages {
                queue.push_front(message.clone());
                journal.push(JournalEntry::Push {
                    channel: channel.to_string(),
                    message: message.clone(),
                });
            }
        }
        self.inner.notify.notify_waiters();
        Ok(())
    }

    async fn blocking_pop(&self, channel: &str, timeout: Duration) -> Result<Option<Delivery>> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking so a push in between is not missed
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(channel) {
                return Ok(Some(Delivery {
                    channel: channel.to_string(),
                    payload,
                }));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn clear(&self, channel: &str) -> Result<()> {
        lock(&self.inner.queues).remove(channel);
        lock(&self.inner.journal).push(JournalEntry::Clear {
            channel: channel.to_string(),
        });
        Ok(())
    }
}
