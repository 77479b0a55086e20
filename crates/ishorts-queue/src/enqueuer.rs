//! Handle used to push stage tasks onto the queue.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::backend::QueueBackend;
use crate::error::QueueResult;
use crate::task::{encode, TaskPayload};

/// Cloneable handle for pushing serialized tasks.
///
/// A push that returns `Ok` is immediately visible to any blocked popper.
#[derive(Clone)]
pub struct Enqueuer {
    backend: Arc<dyn QueueBackend>,
}

impl Enqueuer {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    /// Serialize `payload` and append it to `queue`.
    pub async fn enqueue<T: Serialize + ?Sized + Sync>(
        &self,
        queue: &str,
        payload: &T,
    ) -> QueueResult<()> {
        let payload = encode(payload)?;
        self.backend.push(queue, payload).await?;
        debug!(queue, "Enqueued task");
        Ok(())
    }

    /// Push a stage task onto the queue its stage listens on.
    pub async fn enqueue_task<T: TaskPayload>(&self, task: &T) -> QueueResult<()> {
        self.enqueue(T::QUEUE, task).await
    }

    /// Underlying backend.
    pub fn backend(&self) -> &Arc<dyn QueueBackend> {
        &self.backend
    }
}
