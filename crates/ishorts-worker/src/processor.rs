//! Task processor.
//!
//! One `Processor` is a single logical worker: it pops one task at a time
//! from any of its queues and runs the registered handler to completion
//! before popping again. Scale out by running more processes against the
//! same queues; the backend's atomic pop partitions the work.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ishorts_queue::{Enqueuer, PoppedTask, QueueBackend};

use crate::config::ProcessorConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Handles the payloads popped from one queue.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, payload: &str) -> WorkerResult<()>;
}

/// What happened to one popped task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// Handler returned an error; the task is not retried
    Failed,
    /// No handler registered for the queue; the task is dropped
    Unroutable,
}

/// Record pushed to the dead-letter queue when one is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// Processor that gave up on the task
    pub worker_id: String,
    pub queue: String,
    pub payload: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

pub struct Processor {
    worker_id: String,
    backend: Arc<dyn QueueBackend>,
    enqueuer: Enqueuer,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    config: ProcessorConfig,
    shutdown: watch::Sender<bool>,
}

impl Processor {
    pub fn new(backend: Arc<dyn QueueBackend>, config: ProcessorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            worker_id: format!("worker-{}", Uuid::new_v4()),
            enqueuer: Enqueuer::new(Arc::clone(&backend)),
            backend,
            handlers: HashMap::new(),
            config,
            shutdown,
        }
    }

    /// Associate a handler with a queue. A later registration replaces an
    /// earlier one.
    pub fn register(&mut self, queue: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        let queue = queue.into();
        if self.handlers.insert(queue.clone(), handler).is_some() {
            warn!(queue = %queue, "Replacing previously registered handler");
        } else {
            debug!(queue = %queue, "Registered handler");
        }
    }

    /// Identifier used in logs and dead letters.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Queues with a registered handler.
    pub fn registered_queues(&self) -> Vec<&str> {
        let mut queues: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        queues.sort_unstable();
        queues
    }

    /// Serialize `payload` and append it to `queue`.
    pub async fn enqueue<T: Serialize + ?Sized + Sync>(
        &self,
        queue: &str,
        payload: &T,
    ) -> WorkerResult<()> {
        self.enqueuer.enqueue(queue, payload).await?;
        Ok(())
    }

    /// Handle for handlers that chain to the next stage.
    pub fn enqueuer(&self) -> Enqueuer {
        self.enqueuer.clone()
    }

    /// Pop and dispatch tasks until `shutdown` is called.
    ///
    /// A task being handled when shutdown is requested runs to completion.
    pub async fn listen(&self, queues: &[&str]) -> WorkerResult<()> {
        if queues.is_empty() {
            return Err(WorkerError::config_error("no queues to listen on"));
        }
        for queue in queues {
            if !self.handlers.contains_key(*queue) {
                warn!(queue, "Listening on a queue with no registered handler");
            }
        }

        let mut shutdown_rx = self.shutdown.subscribe();
        info!(worker_id = %self.worker_id, queues = ?queues, "Processor listening");

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            let popped = tokio::select! {
                _ = shutdown_rx.changed() => continue,
                result = self.backend.pop(queues, self.config.pop_timeout) => result,
            };

            match popped {
                Ok(Some(task)) => {
                    self.dispatch(task).await;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Failed to pop task");
                    metrics::record_pop_error();
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        info!(worker_id = %self.worker_id, "Processor stopped");
        Ok(())
    }

    /// Route one popped task to its handler.
    pub async fn dispatch(&self, task: PoppedTask) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(&task.queue) else {
            error!(queue = %task.queue, payload = %task.payload, "No handler registered for queue, dropping task");
            metrics::record_task_unroutable(&task.queue);
            self.dead_letter(&task, "no handler registered for queue").await;
            return DispatchOutcome::Unroutable;
        };

        let started = Instant::now();
        match handler.handle(&task.payload).await {
            Ok(()) => {
                let elapsed = started.elapsed().as_secs_f64();
                debug!(queue = %task.queue, elapsed_secs = elapsed, "Task handled");
                metrics::record_task_handled(&task.queue, elapsed);
                DispatchOutcome::Handled
            }
            Err(e) => {
                error!(
                    queue = %task.queue,
                    payload = %task.payload,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Task failed, dropping"
                );
                metrics::record_task_failed(&task.queue, started.elapsed().as_secs_f64());
                self.dead_letter(&task, &e.to_string()).await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn dead_letter(&self, task: &PoppedTask, reason: &str) {
        let Some(dlq) = self.config.dead_letter_queue.as_deref() else {
            return;
        };

        let letter = DeadLetter {
            worker_id: self.worker_id.clone(),
            queue: task.queue.clone(),
            payload: task.payload.clone(),
            error: reason.to_string(),
            failed_at: Utc::now(),
        };
        match self.enqueuer.enqueue(dlq, &letter).await {
            Ok(()) => metrics::record_dead_letter(&task.queue),
            Err(e) => error!(queue = %task.queue, dlq, error = %e, "Failed to dead-letter task"),
        }
    }

    /// Stop `listen` after the task in flight, if any.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
