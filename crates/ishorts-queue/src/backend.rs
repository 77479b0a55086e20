//! Queue backend abstraction.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::error::QueueResult;

/// Stream of raw notification payloads from a pub/sub channel.
pub type NotificationStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// An item removed from the head of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoppedTask {
    /// Name of the queue the item came from
    pub queue: String,
    /// Raw serialized payload
    pub payload: String,
}

/// Shared list and broadcast service reachable by every worker and scheduler.
///
/// Implementations must hand each pushed item to exactly one `pop` caller;
/// that atomic pop is the only mutual exclusion the pipeline relies on.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Append a payload to the tail of a queue.
    async fn push(&self, queue: &str, payload: String) -> QueueResult<()>;

    /// Pop the oldest item from whichever of `queues` has one ready first.
    ///
    /// Blocks up to `timeout` and returns `None` when nothing arrived.
    async fn pop(&self, queues: &[&str], timeout: Duration) -> QueueResult<Option<PoppedTask>>;

    /// Number of items waiting in a queue.
    async fn len(&self, queue: &str) -> QueueResult<u64>;

    /// Broadcast a payload to every current subscriber of a channel.
    async fn publish(&self, channel: &str, payload: String) -> QueueResult<()>;

    /// Subscribe to a channel.
    async fn subscribe(&self, channel: &str) -> QueueResult<NotificationStream>;
}
