//! Generation contract used by the stage handlers.

use async_trait::async_trait;

use ishorts_models::{Series, VideoScene};

use crate::error::LlmResult;
use crate::types::SceneOutline;

/// Produces the text content of a video.
///
/// Implementations return trimmed, non-empty values; an empty model answer
/// is an error rather than an empty string.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// A title for the next video that differs from `existing_titles`.
    async fn generate_title(&self, series: &Series, existing_titles: &[String])
        -> LlmResult<String>;

    /// Ordered scene outlines for a titled video. Never empty on success.
    async fn generate_scene_breakdown(
        &self,
        series: &Series,
        title: &str,
    ) -> LlmResult<Vec<SceneOutline>>;

    /// A text-to-video prompt for one scene in the series' visual style.
    async fn generate_scene_prompt(
        &self,
        series: &Series,
        style: &str,
        outline: &SceneOutline,
    ) -> LlmResult<String>;

    /// Narrator voiceover aligned with the saved scenes.
    async fn generate_script(
        &self,
        series: &Series,
        title: &str,
        scenes: &[VideoScene],
    ) -> LlmResult<String>;
}
