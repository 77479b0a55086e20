//! In-process queue backend.
//!
//! Mirrors the Redis semantics the pipeline depends on: FIFO per queue,
//! each item delivered to exactly one popper, blocking pops that give up
//! after a timeout, and fire-and-forget broadcast channels.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

use crate::backend::{NotificationStream, PoppedTask, QueueBackend};
use crate::error::{QueueError, QueueResult};

const CHANNEL_CAPACITY: usize = 256;

/// Queue backend held entirely in memory.
#[derive(Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    pushed: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the payloads waiting in a queue, oldest first.
    pub fn peek(&self, queue: &str) -> Vec<String> {
        self.lists
            .lock()
            .map(|lists| {
                lists
                    .get(queue)
                    .map(|items| items.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn try_pop(&self, queues: &[&str]) -> QueueResult<Option<PoppedTask>> {
        let mut lists = self
            .lists
            .lock()
            .map_err(|_| QueueError::dequeue_failed("queue lock poisoned"))?;

        for queue in queues {
            if let Some(payload) = lists.get_mut(*queue).and_then(VecDeque::pop_front) {
                return Ok(Some(PoppedTask {
                    queue: queue.to_string(),
                    payload,
                }));
            }
        }
        Ok(None)
    }

    fn sender(&self, channel: &str) -> QueueResult<broadcast::Sender<String>> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| QueueError::connection_failed("channel lock poisoned"))?;
        Ok(channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone())
    }
}

#[async_trait]
impl QueueBackend for MemoryQueue {
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()> {
        {
            let mut lists = self
                .lists
                .lock()
                .map_err(|_| QueueError::enqueue_failed("queue lock poisoned"))?;
            lists.entry(queue.to_string()).or_default().push_back(payload);
        }
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn pop(&self, queues: &[&str], timeout: Duration) -> QueueResult<Option<PoppedTask>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register interest before checking so a push between the check
            // and the wait still wakes us.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(task) = self.try_pop(queues)? {
                return Ok(Some(task));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_pop(queues);
            }
        }
    }

    async fn len(&self, queue: &str) -> QueueResult<u64> {
        let lists = self
            .lists
            .lock()
            .map_err(|_| QueueError::dequeue_failed("queue lock poisoned"))?;
        Ok(lists.get(queue).map(|items| items.len() as u64).unwrap_or(0))
    }

    async fn publish(&self, channel: &str, payload: String) -> QueueResult<()> {
        // No subscribers is not an error, matching Redis PUBLISH.
        let _ = self.sender(channel)?.send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> QueueResult<NotificationStream> {
        let rx = self.sender(channel)?.subscribe();

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => return Some((payload, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
