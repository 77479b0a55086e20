//! Prometheus metrics for the worker.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use ishorts_models::Stage;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_HANDLED_TOTAL: &str = "ishorts_tasks_handled_total";
    pub const TASKS_FAILED_TOTAL: &str = "ishorts_tasks_failed_total";
    pub const TASKS_UNROUTABLE_TOTAL: &str = "ishorts_tasks_unroutable_total";
    pub const TASK_DURATION_SECONDS: &str = "ishorts_task_duration_seconds";
    pub const DEAD_LETTERS_TOTAL: &str = "ishorts_dead_letters_total";
    pub const POP_ERRORS_TOTAL: &str = "ishorts_pop_errors_total";

    pub const STAGE_FAILURES_TOTAL: &str = "ishorts_stage_failures_total";
    pub const GENERATION_DURATION_SECONDS: &str = "ishorts_generation_duration_seconds";
    pub const VIDEOS_COMPLETED_TOTAL: &str = "ishorts_videos_completed_total";
}

pub fn record_task_handled(queue: &str, duration_secs: f64) {
    let labels = [("queue", queue.to_string())];
    counter!(names::TASKS_HANDLED_TOTAL, &labels).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_task_failed(queue: &str, duration_secs: f64) {
    let labels = [("queue", queue.to_string())];
    counter!(names::TASKS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_task_unroutable(queue: &str) {
    let labels = [("queue", queue.to_string())];
    counter!(names::TASKS_UNROUTABLE_TOTAL, &labels).increment(1);
}

pub fn record_dead_letter(queue: &str) {
    let labels = [("queue", queue.to_string())];
    counter!(names::DEAD_LETTERS_TOTAL, &labels).increment(1);
}

pub fn record_pop_error() {
    counter!(names::POP_ERRORS_TOTAL).increment(1);
}

/// Record a failed_* status written by a stage.
pub fn record_stage_failure(stage: Stage, status: &str) {
    let labels = [
        ("stage", stage.as_str().to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::STAGE_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_generation_duration(stage: Stage, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_video_completed() {
    counter!(names::VIDEOS_COMPLETED_TOTAL).increment(1);
}
