//! Generated scene models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::ids::VideoId;

/// A persisted scene belonging to one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoScene {
    pub id: i64,

    pub video_id: VideoId,

    /// 1-based position within the video
    pub scene_number: i32,

    /// Visual description of setting and action
    pub description: String,

    /// Text-to-video generation prompt
    pub prompt: String,

    /// Duration in seconds
    pub duration: f32,

    pub created_at: DateTime<Utc>,
}

/// A scene ready to be written as part of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScene {
    pub scene_number: i32,
    pub description: String,
    pub prompt: String,
    pub duration: f32,
}

/// Check the invariants of a scene batch before it is persisted.
///
/// A batch must be non-empty, numbered 1..=n in order, and every
/// duration must be a positive finite number of seconds.
pub fn validate_scene_set(scenes: &[NewScene]) -> ModelResult<()> {
    if scenes.is_empty() {
        return Err(ModelError::invalid_scene_set("no scenes"));
    }

    for (idx, scene) in scenes.iter().enumerate() {
        let expected = idx as i32 + 1;
        if scene.scene_number != expected {
            return Err(ModelError::invalid_scene_set(format!(
                "expected scene number {}, found {}",
                expected, scene.scene_number
            )));
        }
        if !scene.duration.is_finite() || scene.duration <= 0.0 {
            return Err(ModelError::invalid_scene_set(format!(
                "scene {} has non-positive duration {}",
                scene.scene_number, scene.duration
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(n: i32, duration: f32) -> NewScene {
        NewScene {
            scene_number: n,
            description: format!("scene {}", n),
            prompt: format!("prompt {}", n),
            duration,
        }
    }

    #[test]
    fn test_contiguous_scene_set_is_valid() {
        assert!(validate_scene_set(&[scene(1, 4.0), scene(2, 6.5), scene(3, 5.0)]).is_ok());
    }

    #[test]
    fn test_gap_in_numbering_is_rejected() {
        let err = validate_scene_set(&[scene(1, 4.0), scene(3, 6.5)]).unwrap_err();
        assert!(err.to_string().contains("expected scene number 2"));
    }

    #[test]
    fn test_empty_and_zero_duration_rejected() {
        assert!(validate_scene_set(&[]).is_err());
        assert!(validate_scene_set(&[scene(1, 0.0)]).is_err());
        assert!(validate_scene_set(&[scene(1, f32::NAN)]).is_err());
    }
}
