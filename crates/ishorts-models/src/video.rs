//! Video models and the per-video status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{SeriesId, VideoId};

/// Video production status.
///
/// Persisted verbatim as a text column and surfaced unchanged to API readers,
/// so the serialized tokens are part of the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Row created, title task queued
    #[default]
    Pending,
    ProcessingTitle,
    PendingScenes,
    ProcessingScenes,
    PendingScript,
    ProcessingScript,
    PendingRender,
    Rendering,
    /// All enabled stages finished
    Complete,
    FailedTitle,
    /// Scene stage ran before a title existed
    FailedScenesNoTitle,
    FailedScenes,
    FailedSaveScenes,
    FailedScript,
    /// Title saved but the scene task could not be queued
    FailedQueueScenes,
    FailedQueueScript,
    FailedQueueRender,
}

/// Status sequence of a video that runs the whole pipeline with rendering disabled.
pub const HAPPY_PATH: [VideoStatus; 7] = [
    VideoStatus::Pending,
    VideoStatus::ProcessingTitle,
    VideoStatus::PendingScenes,
    VideoStatus::ProcessingScenes,
    VideoStatus::PendingScript,
    VideoStatus::ProcessingScript,
    VideoStatus::Complete,
];

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::ProcessingTitle => "processing_title",
            VideoStatus::PendingScenes => "pending_scenes",
            VideoStatus::ProcessingScenes => "processing_scenes",
            VideoStatus::PendingScript => "pending_script",
            VideoStatus::ProcessingScript => "processing_script",
            VideoStatus::PendingRender => "pending_render",
            VideoStatus::Rendering => "rendering",
            VideoStatus::Complete => "complete",
            VideoStatus::FailedTitle => "failed_title",
            VideoStatus::FailedScenesNoTitle => "failed_scenes_no_title",
            VideoStatus::FailedScenes => "failed_scenes",
            VideoStatus::FailedSaveScenes => "failed_save_scenes",
            VideoStatus::FailedScript => "failed_script",
            VideoStatus::FailedQueueScenes => "failed_queue_scenes",
            VideoStatus::FailedQueueScript => "failed_queue_script",
            VideoStatus::FailedQueueRender => "failed_queue_render",
        }
    }

    /// Check if the pipeline halted this video with a `failed_*` status.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            VideoStatus::FailedTitle
                | VideoStatus::FailedScenesNoTitle
                | VideoStatus::FailedScenes
                | VideoStatus::FailedSaveScenes
                | VideoStatus::FailedScript
                | VideoStatus::FailedQueueScenes
                | VideoStatus::FailedQueueScript
                | VideoStatus::FailedQueueRender
        )
    }

    /// Check if no further automatic transition will happen.
    ///
    /// Failed videos only move again when an operator re-enqueues a task.
    pub fn is_terminal(&self) -> bool {
        *self == VideoStatus::Complete || self.is_failed()
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "pending" => VideoStatus::Pending,
            "processing_title" => VideoStatus::ProcessingTitle,
            "pending_scenes" => VideoStatus::PendingScenes,
            "processing_scenes" => VideoStatus::ProcessingScenes,
            "pending_script" => VideoStatus::PendingScript,
            "processing_script" => VideoStatus::ProcessingScript,
            "pending_render" => VideoStatus::PendingRender,
            "rendering" => VideoStatus::Rendering,
            "complete" => VideoStatus::Complete,
            "failed_title" => VideoStatus::FailedTitle,
            "failed_scenes_no_title" => VideoStatus::FailedScenesNoTitle,
            "failed_scenes" => VideoStatus::FailedScenes,
            "failed_save_scenes" => VideoStatus::FailedSaveScenes,
            "failed_script" => VideoStatus::FailedScript,
            "failed_queue_scenes" => VideoStatus::FailedQueueScenes,
            "failed_queue_script" => VideoStatus::FailedQueueScript,
            "failed_queue_render" => VideoStatus::FailedQueueRender,
            other => return Err(ModelError::UnknownStatus(other.to_string())),
        };
        Ok(status)
    }
}

/// A single video produced for a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,

    pub series_id: SeriesId,

    /// Set by the title stage
    #[serde(default)]
    pub title: Option<String>,

    /// Set by the script stage
    #[serde(default)]
    pub script: Option<String>,

    #[serde(default)]
    pub status: VideoStatus,

    pub created_at: DateTime<Utc>,
}

impl Video {
    /// Create a fresh pending video for a series.
    pub fn pending(id: VideoId, series_id: SeriesId) -> Self {
        Self {
            id,
            series_id,
            title: None,
            script: None,
            status: VideoStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Title, if one has been generated and is not blank.
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_title(&self) -> bool {
        self.title().is_some()
    }
}
