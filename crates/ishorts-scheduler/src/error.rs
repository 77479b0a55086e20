//! Scheduler error types.

use thiserror::Error;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("posts_per_day {0} is outside 1..=3")]
    InvalidPostsPerDay(i32),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Notification stream ended")]
    NotificationsClosed,

    #[error("Queue error: {0}")]
    Queue(#[from] ishorts_queue::QueueError),

    #[error("Store error: {0}")]
    Store(#[from] ishorts_store::StoreError),

    #[error("Invalid series: {0}")]
    Model(#[from] ishorts_models::ModelError),
}
