//! Structured response shapes requested from the model.
//!
//! Doc comments on fields become schema descriptions, so they are written
//! as instructions to the model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TitleResponse {
    /// A unique, engaging title for the video
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SceneBreakdown {
    /// A list of distinct visual scenes that will make up the video. Aim for 3-5 scenes.
    pub scenes: Vec<SceneOutline>,
}

/// One scene of a breakdown, before its generation prompt exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneOutline {
    /// A detailed, visual description of the scene's action and setting, without camera details.
    pub description: String,

    /// The approximate duration of this scene in seconds (e.g., 2.5). Sum of durations should be around 15-30 seconds.
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromptGeneration {
    /// The high-quality text-to-video generation prompt for this scene.
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScriptResponse {
    /// The narrator voiceover for the whole video, written to be read aloud by one person.
    pub script: String,
}
