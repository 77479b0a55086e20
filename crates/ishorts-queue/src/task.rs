//! Queue names and task payloads for each pipeline stage.
//!
//! Payloads carry only the video id. Everything else a handler needs
//! (series, sibling titles, scenes) is read back from the job store, so the
//! queue never holds state that could go stale.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ishorts_models::{Stage, VideoId};

use crate::error::{QueueError, QueueResult};

/// First step: generate a title.
pub const QUEUE_VIDEO_TITLE: &str = "q_video_title";

/// Second step: generate scenes and their prompts.
pub const QUEUE_SCENE_GENERATION: &str = "q_scene_generation";

/// Third step: generate the narration script.
pub const QUEUE_VIDEO_SCRIPT: &str = "q_video_script";

/// Optional fourth step: render the video.
pub const QUEUE_VIDEO_RENDER: &str = "q_video_render";

/// Every stage queue, in pipeline order.
pub const ALL_QUEUES: [&str; 4] = [
    QUEUE_VIDEO_TITLE,
    QUEUE_SCENE_GENERATION,
    QUEUE_VIDEO_SCRIPT,
    QUEUE_VIDEO_RENDER,
];

/// A payload that triggers one pipeline stage for one video.
pub trait TaskPayload: Serialize + DeserializeOwned + Send + Sync {
    /// Queue the payload is pushed to.
    const QUEUE: &'static str;

    /// Stage the payload triggers.
    const STAGE: Stage;

    fn new(video_id: VideoId) -> Self;

    fn video_id(&self) -> VideoId;
}

macro_rules! stage_task {
    ($(#[$doc:meta])* $name:ident, $queue:expr, $stage:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub video_id: VideoId,
        }

        impl TaskPayload for $name {
            const QUEUE: &'static str = $queue;
            const STAGE: Stage = $stage;

            fn new(video_id: VideoId) -> Self {
                Self { video_id }
            }

            fn video_id(&self) -> VideoId {
                self.video_id
            }
        }
    };
}

stage_task!(
    /// Payload for [`QUEUE_VIDEO_TITLE`].
    TitleTask,
    QUEUE_VIDEO_TITLE,
    Stage::Title
);
stage_task!(
    /// Payload for [`QUEUE_SCENE_GENERATION`].
    SceneTask,
    QUEUE_SCENE_GENERATION,
    Stage::Scenes
);
stage_task!(
    /// Payload for [`QUEUE_VIDEO_SCRIPT`].
    ScriptTask,
    QUEUE_VIDEO_SCRIPT,
    Stage::Script
);
stage_task!(
    /// Payload for [`QUEUE_VIDEO_RENDER`].
    RenderTask,
    QUEUE_VIDEO_RENDER,
    Stage::Render
);

/// Serialize a payload to the flat JSON text pushed onto a queue.
pub fn encode<T: Serialize + ?Sized>(payload: &T) -> QueueResult<String> {
    Ok(serde_json::to_string(payload)?)
}

/// Deserialize a popped payload.
pub fn decode<T: DeserializeOwned>(payload: &str) -> QueueResult<T> {
    serde_json::from_str(payload).map_err(|e| {
        QueueError::Serialization(format!("malformed payload {:?}: {}", payload, e))
    })
}

/// Queue that carries tasks for a stage.
pub fn queue_for_stage(stage: Stage) -> &'static str {
    match stage {
        Stage::Title => QUEUE_VIDEO_TITLE,
        Stage::Scenes => QUEUE_SCENE_GENERATION,
        Stage::Script => QUEUE_VIDEO_SCRIPT,
        Stage::Render => QUEUE_VIDEO_RENDER,
    }
}

/// Stage served by a queue, if the name is one of the pipeline queues.
pub fn stage_for_queue(queue: &str) -> Option<Stage> {
    Stage::ALL
        .into_iter()
        .find(|stage| queue_for_stage(*stage) == queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_format() {
        let payload = encode(&SceneTask::new(VideoId(12))).unwrap();
        assert_eq!(payload, r#"{"video_id":12}"#);

        let task: ScriptTask = decode(r#"{"video_id":7}"#).unwrap();
        assert_eq!(task.video_id(), VideoId(7));
    }

    #[test]
    fn test_malformed_payload_is_serialization_error() {
        let err = decode::<TitleTask>("not json").unwrap_err();
        assert!(matches!(err, QueueError::Serialization(_)));
        assert!(!err.is_backend());

        let err = decode::<TitleTask>(r#"{"video":1}"#).unwrap_err();
        assert!(matches!(err, QueueError::Serialization(_)));
    }

    #[test]
    fn test_stage_queue_mapping() {
        assert_eq!(queue_for_stage(Stage::Scenes), QUEUE_SCENE_GENERATION);
        assert_eq!(stage_for_queue(QUEUE_VIDEO_RENDER), Some(Stage::Render));
        assert_eq!(stage_for_queue("q_unknown"), None);
        assert_eq!(TitleTask::QUEUE, queue_for_stage(TitleTask::STAGE));
        assert_eq!(RenderTask::QUEUE, queue_for_stage(RenderTask::STAGE));
    }
}
