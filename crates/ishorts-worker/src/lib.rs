//! Pipeline worker.
//!
//! This crate provides:
//! - The `Processor` run-loop: handler registry, multi-queue pop, dispatch
//! - Stage handlers for title, scenes, script and render
//! - Structured task logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::{ProcessorConfig, StageConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use handlers::{register_stages, RenderStage, SceneStage, ScriptStage, StageContext, TitleStage};
pub use logging::TaskLogger;
pub use processor::{DeadLetter, DispatchOutcome, Processor, TaskHandler};
