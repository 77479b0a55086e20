//! Task queue and notifications for the production pipeline.
//!
//! This crate provides:
//! - Queue names and task payloads for each pipeline stage
//! - A queue backend abstraction over Redis lists and pub/sub
//! - An in-memory backend with the same delivery semantics
//! - The `series_created` notification

pub mod backend;
pub mod enqueuer;
pub mod error;
pub mod memory;
pub mod notification;
pub mod redis_queue;
pub mod task;

pub use backend::{NotificationStream, PoppedTask, QueueBackend};
pub use enqueuer::Enqueuer;
pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use notification::{publish_series_created, SeriesCreated, SERIES_CREATED_CHANNEL};
pub use redis_queue::{QueueConfig, RedisQueue};
pub use task::{
    decode, encode, queue_for_stage, stage_for_queue, RenderTask, SceneTask, ScriptTask,
    TaskPayload, TitleTask, ALL_QUEUES, QUEUE_SCENE_GENERATION, QUEUE_VIDEO_RENDER,
    QUEUE_VIDEO_SCRIPT, QUEUE_VIDEO_TITLE,
};
