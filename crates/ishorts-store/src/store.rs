//! Storage contract used by the pipeline.

use async_trait::async_trait;

use ishorts_models::{NewScene, Series, SeriesId, Video, VideoId, VideoScene, VideoStatus};

use crate::error::StoreResult;

/// Durable storage for series, videos and scenes.
///
/// Status writes are visible to readers as soon as they return; they are
/// not transactional with the work around them. `save_scenes` is the one
/// multi-row write and must be all-or-nothing.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_series(&self, id: SeriesId) -> StoreResult<Series>;

    async fn get_video(&self, id: VideoId) -> StoreResult<Video>;

    /// Non-blank titles of every other video in the series.
    async fn list_sibling_titles(
        &self,
        series_id: SeriesId,
        exclude: VideoId,
    ) -> StoreResult<Vec<String>>;

    /// Insert a `pending` video row for a series.
    async fn create_pending_video(&self, series_id: SeriesId) -> StoreResult<Video>;

    async fn set_status(&self, id: VideoId, status: VideoStatus) -> StoreResult<()>;

    async fn set_title(&self, id: VideoId, title: &str) -> StoreResult<()>;

    async fn set_script(&self, id: VideoId, script: &str) -> StoreResult<()>;

    /// Scenes of a video ordered by scene number.
    async fn list_scenes(&self, id: VideoId) -> StoreResult<Vec<VideoScene>>;

    /// Write a validated scene batch in one transaction.
    async fn save_scenes(&self, id: VideoId, scenes: &[NewScene]) -> StoreResult<Vec<VideoScene>>;
}
