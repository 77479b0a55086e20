//! Pipeline stages and the status each one reads and writes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::video::VideoStatus;

/// One stop in the production pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Title,
    Scenes,
    Script,
    Render,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Title, Stage::Scenes, Stage::Script, Stage::Render];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Title => "title",
            Stage::Scenes => "scenes",
            Stage::Script => "script",
            Stage::Render => "render",
        }
    }

    /// Status written while the stage is working on a video.
    pub fn processing_status(&self) -> VideoStatus {
        match self {
            Stage::Title => VideoStatus::ProcessingTitle,
            Stage::Scenes => VideoStatus::ProcessingScenes,
            Stage::Script => VideoStatus::ProcessingScript,
            Stage::Render => VideoStatus::Rendering,
        }
    }

    /// Status of a video whose task for this stage is queued.
    pub fn pending_status(&self) -> VideoStatus {
        match self {
            Stage::Title => VideoStatus::Pending,
            Stage::Scenes => VideoStatus::PendingScenes,
            Stage::Script => VideoStatus::PendingScript,
            Stage::Render => VideoStatus::PendingRender,
        }
    }

    /// Status written when the stage's own work fails.
    ///
    /// Rendering is a placeholder with no failure mode of its own.
    pub fn failed_status(&self) -> Option<VideoStatus> {
        match self {
            Stage::Title => Some(VideoStatus::FailedTitle),
            Stage::Scenes => Some(VideoStatus::FailedScenes),
            Stage::Script => Some(VideoStatus::FailedScript),
            Stage::Render => None,
        }
    }

    /// Status written when a task for this stage could not be queued.
    pub fn failed_queue_status(&self) -> Option<VideoStatus> {
        match self {
            Stage::Title => None,
            Stage::Scenes => Some(VideoStatus::FailedQueueScenes),
            Stage::Script => Some(VideoStatus::FailedQueueScript),
            Stage::Render => Some(VideoStatus::FailedQueueRender),
        }
    }

    /// Stage that follows this one, if any.
    pub fn next(&self, render_enabled: bool) -> Option<Stage> {
        match self {
            Stage::Title => Some(Stage::Scenes),
            Stage::Scenes => Some(Stage::Script),
            Stage::Script if render_enabled => Some(Stage::Render),
            Stage::Script | Stage::Render => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_chain() {
        assert_eq!(Stage::Title.next(false), Some(Stage::Scenes));
        assert_eq!(Stage::Scenes.next(false), Some(Stage::Script));
        assert_eq!(Stage::Script.next(false), None);
        assert_eq!(Stage::Script.next(true), Some(Stage::Render));
        assert_eq!(Stage::Render.next(true), None);
    }

    #[test]
    fn test_queue_failure_statuses() {
        assert_eq!(
            Stage::Scenes.failed_queue_status(),
            Some(VideoStatus::FailedQueueScenes)
        );
        assert_eq!(Stage::Title.failed_queue_status(), None);
        assert_eq!(Stage::Render.processing_status(), VideoStatus::Rendering);
    }
}
