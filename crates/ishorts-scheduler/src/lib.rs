//! Production scheduler.
//!
//! This crate provides:
//! - `ProductionScheduler`: one recurring timer per series, installed from
//!   `series_created` notifications
//! - `produce_batch`: creates pending videos and queues their title tasks
//! - `SeriesLauncher`: the immediate first batch at series creation
//!
//! Timers live in process memory. Run exactly one scheduler per deployment;
//! a second instance would install its own timers and double every batch.

pub mod batch;
pub mod config;
pub mod error;
pub mod launch;
pub mod scheduler;

pub use batch::{produce_batch, BatchReport};
pub use config::SchedulerConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use launch::SeriesLauncher;
pub use scheduler::ProductionScheduler;
