//! Structured task logging utilities.

use tracing::{error, info, warn, Span};

use ishorts_models::{Stage, VideoId};

/// Logger carrying the video and stage of the task being handled.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    video_id: VideoId,
    stage: Stage,
}

impl TaskLogger {
    pub fn new(video_id: VideoId, stage: Stage) -> Self {
        Self { video_id, stage }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Span for everything a handler does with one task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            video_id = %self.video_id,
            stage = %self.stage
        )
    }
}
