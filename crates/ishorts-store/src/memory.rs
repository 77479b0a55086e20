//! In-memory job store.
//!
//! Mirrors the Postgres semantics closely enough to drive the pipeline in
//! tests and local runs: ids are assigned sequentially, scene batches are
//! validated and written atomically, and every status write is recorded.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use ishorts_models::{
    validate_scene_set, NewScene, Series, SeriesId, Video, VideoId, VideoScene, VideoStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

#[derive(Default)]
struct Tables {
    series: HashMap<SeriesId, Series>,
    videos: HashMap<VideoId, Video>,
    scenes: Vec<VideoScene>,
    history: HashMap<VideoId, Vec<VideoStatus>>,
    next_video_id: i64,
    next_scene_id: i64,
    fail_scene_row: Option<usize>,
    fail_status: Option<VideoStatus>,
    unavailable: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_series(&self, series: Series) {
        self.lock().series.insert(series.id, series);
    }

    /// Insert a video row as-is, e.g. one already carrying a title.
    pub fn insert_video(&self, video: Video) {
        let mut tables = self.lock();
        tables.next_video_id = tables.next_video_id.max(video.id.get());
        tables.history.entry(video.id).or_default().push(video.status);
        tables.videos.insert(video.id, video);
    }

    /// Every status the video has held, oldest first.
    pub fn status_history(&self, id: VideoId) -> Vec<VideoStatus> {
        self.lock().history.get(&id).cloned().unwrap_or_default()
    }

    pub fn videos_for_series(&self, series_id: SeriesId) -> Vec<Video> {
        let mut videos: Vec<Video> = self
            .lock()
            .videos
            .values()
            .filter(|v| v.series_id == series_id)
            .cloned()
            .collect();
        videos.sort_by_key(|v| v.id);
        videos
    }

    pub fn scene_count(&self) -> usize {
        self.lock().scenes.len()
    }

    /// Fail the next scene batch when it reaches the given 0-based row.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_scene_row(&self, row: usize) {
        self.lock().fail_scene_row = Some(row);
    }

    /// Fail the next write of `status`. Later writes succeed.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_status_write(&self, status: VideoStatus) {
        self.lock().fail_status = Some(status);
    }

    /// Make every operation fail as if the database were down.
    #[cfg(any(test, feature = "test-util"))]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn check_available(tables: &Tables) -> StoreResult<()> {
        if tables.unavailable {
            return Err(StoreError::unavailable("store is offline"));
        }
        Ok(())
    }

    fn update_video<F>(&self, id: VideoId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Video),
    {
        let mut tables = self.lock();
        Self::check_available(&tables)?;
        let video = tables
            .videos
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("video", id.get()))?;
        f(video);
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get_series(&self, id: SeriesId) -> StoreResult<Series> {
        let tables = self.lock();
        Self::check_available(&tables)?;
        tables
            .series
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("series", id.get()))
    }

    async fn get_video(&self, id: VideoId) -> StoreResult<Video> {
        let tables = self.lock();
        Self::check_available(&tables)?;
        tables
            .videos
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("video", id.get()))
    }

    async fn list_sibling_titles(
        &self,
        series_id: SeriesId,
        exclude: VideoId,
    ) -> StoreResult<Vec<String>> {
        let tables = self.lock();
        Self::check_available(&tables)?;
        let mut siblings: Vec<&Video> = tables
            .videos
            .values()
            .filter(|v| v.series_id == series_id && v.id != exclude)
            .collect();
        siblings.sort_by_key(|v| v.id);
        Ok(siblings
            .into_iter()
            .filter_map(|v| v.title().map(str::to_string))
            .collect())
    }

    async fn create_pending_video(&self, series_id: SeriesId) -> StoreResult<Video> {
        let mut tables = self.lock();
        Self::check_available(&tables)?;
        if !tables.series.contains_key(&series_id) {
            return Err(StoreError::not_found("series", series_id.get()));
        }
        tables.next_video_id += 1;
        let video = Video::pending(VideoId(tables.next_video_id), series_id);
        tables.history.entry(video.id).or_default().push(video.status);
        tables.videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn set_status(&self, id: VideoId, status: VideoStatus) -> StoreResult<()> {
        let mut tables = self.lock();
        Self::check_available(&tables)?;
        if tables.fail_status == Some(status) {
            tables.fail_status = None;
            return Err(StoreError::unavailable(format!(
                "injected failure writing status {}",
                status
            )));
        }
        let video = tables
            .videos
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("video", id.get()))?;
        video.status = status;
        tables.history.entry(id).or_default().push(status);
        Ok(())
    }

    async fn set_title(&self, id: VideoId, title: &str) -> StoreResult<()> {
        self.update_video(id, |v| v.title = Some(title.to_string()))
    }

    async fn set_script(&self, id: VideoId, script: &str) -> StoreResult<()> {
        self.update_video(id, |v| v.script = Some(script.to_string()))
    }

    async fn list_scenes(&self, id: VideoId) -> StoreResult<Vec<VideoScene>> {
        let tables = self.lock();
        Self::check_available(&tables)?;
        let mut scenes: Vec<VideoScene> = tables
            .scenes
            .iter()
            .filter(|s| s.video_id == id)
            .cloned()
            .collect();
        scenes.sort_by_key(|s| s.scene_number);
        Ok(scenes)
    }

    async fn save_scenes(&self, id: VideoId, scenes: &[NewScene]) -> StoreResult<Vec<VideoScene>> {
        validate_scene_set(scenes)?;

        let mut tables = self.lock();
        Self::check_available(&tables)?;
        if !tables.videos.contains_key(&id) {
            return Err(StoreError::not_found("video", id.get()));
        }

        // Build the whole batch before touching the table.
        let fail_at = tables.fail_scene_row.take();
        let mut next_id = tables.next_scene_id;
        let now = Utc::now();
        let mut batch = Vec::with_capacity(scenes.len());
        for (row, scene) in scenes.iter().enumerate() {
            if fail_at == Some(row) {
                return Err(StoreError::unavailable(format!(
                    "injected failure at scene row {}",
                    row
                )));
            }
            next_id += 1;
            batch.push(VideoScene {
                id: next_id,
                video_id: id,
                scene_number: scene.scene_number,
                description: scene.description.clone(),
                prompt: scene.prompt.clone(),
                duration: scene.duration,
                created_at: now,
            });
        }

        tables.next_scene_id = next_id;
        tables.scenes.extend(batch.iter().cloned());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_series() -> (MemoryStore, SeriesId) {
        let store = MemoryStore::new();
        let series_id = SeriesId(1);
        store.insert_series(Series::new(
            series_id,
            10,
            "Space facts".to_string(),
            "Short facts about space".to_string(),
            2,
        ));
        (store, series_id)
    }

    fn scene(n: i32) -> NewScene {
        NewScene {
            scene_number: n,
            description: format!("scene {}", n),
            prompt: format!("prompt {}", n),
            duration: 5.0,
        }
    }

    #[tokio::test]
    async fn test_create_pending_video_assigns_ids() {
        let (store, series_id) = store_with_series();
        let a = store.create_pending_video(series_id).await.unwrap();
        let b = store.create_pending_video(series_id).await.unwrap();

        assert_eq!(a.status, VideoStatus::Pending);
        assert!(b.id > a.id);
        assert_eq!(store.videos_for_series(series_id).len(), 2);
    }

    #[tokio::test]
    async fn test_create_for_unknown_series_fails() {
        let store = MemoryStore::new();
        let err = store.create_pending_video(SeriesId(99)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_sibling_titles_skip_self_and_blank() {
        let (store, series_id) = store_with_series();
        let a = store.create_pending_video(series_id).await.unwrap();
        let b = store.create_pending_video(series_id).await.unwrap();
        let c = store.create_pending_video(series_id).await.unwrap();
        store.set_title(a.id, "Black holes").await.unwrap();
        store.set_title(b.id, "   ").await.unwrap();
        store.set_title(c.id, "Neutron stars").await.unwrap();

        let titles = store.list_sibling_titles(series_id, c.id).await.unwrap();
        assert_eq!(titles, vec!["Black holes".to_string()]);
    }

    #[tokio::test]
    async fn test_status_history_records_every_write() {
        let (store, series_id) = store_with_series();
        let video = store.create_pending_video(series_id).await.unwrap();
        store
            .set_status(video.id, VideoStatus::ProcessingTitle)
            .await
            .unwrap();
        store
            .set_status(video.id, VideoStatus::FailedTitle)
            .await
            .unwrap();

        assert_eq!(
            store.status_history(video.id),
            vec![
                VideoStatus::Pending,
                VideoStatus::ProcessingTitle,
                VideoStatus::FailedTitle
            ]
        );
    }

    #[tokio::test]
    async fn test_status_and_history_move_together() {
        let (store, series_id) = store_with_series();
        let video = store.create_pending_video(series_id).await.unwrap();

        store.fail_status_write(VideoStatus::ProcessingTitle);
        assert!(store
            .set_status(video.id, VideoStatus::ProcessingTitle)
            .await
            .is_err());
        assert_eq!(
            store.get_video(video.id).await.unwrap().status,
            VideoStatus::Pending
        );
        assert_eq!(store.status_history(video.id), vec![VideoStatus::Pending]);

        store
            .set_status(video.id, VideoStatus::ProcessingTitle)
            .await
            .unwrap();
        let current = store.get_video(video.id).await.unwrap().status;
        assert_eq!(store.status_history(video.id).last(), Some(&current));
    }

    #[tokio::test]
    async fn test_save_scenes_is_all_or_nothing() {
        let (store, series_id) = store_with_series();
        let video = store.create_pending_video(series_id).await.unwrap();

        store.fail_scene_row(2);
        let result = store
            .save_scenes(video.id, &[scene(1), scene(2), scene(3)])
            .await;
        assert!(result.is_err());
        assert_eq!(store.scene_count(), 0);

        let saved = store
            .save_scenes(video.id, &[scene(1), scene(2), scene(3)])
            .await
            .unwrap();
        assert_eq!(saved.len(), 3);
        let listed = store.list_scenes(video.id).await.unwrap();
        assert_eq!(
            listed.iter().map(|s| s.scene_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_save_scenes_rejects_invalid_batch() {
        let (store, series_id) = store_with_series();
        let video = store.create_pending_video(series_id).await.unwrap();

        let err = store
            .save_scenes(video.id, &[scene(1), scene(3)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSceneSet(_)));
        assert_eq!(store.scene_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let (store, series_id) = store_with_series();
        store.set_unavailable(true);
        assert!(matches!(
            store.get_series(series_id).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
