//! Launcher and scheduler working together on the in-memory backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use ishorts_models::{NewScene, Series, SeriesId, Video, VideoId, VideoScene, VideoStatus};
use ishorts_queue::{Enqueuer, MemoryQueue, QueueBackend, QUEUE_VIDEO_TITLE, SERIES_CREATED_CHANNEL};
use ishorts_scheduler::{produce_batch, ProductionScheduler, SchedulerConfig, SeriesLauncher};
use ishorts_store::{JobStore, MemoryStore, StoreError, StoreResult};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test(start_paused = true)]
async fn test_series_creation_produces_one_batch_per_day() {
    let series = Series::new(SeriesId(1), 7, "Night sky", "Constellations explained", 2);
    let store = Arc::new(MemoryStore::new());
    store.insert_series(series.clone());
    let queue = Arc::new(MemoryQueue::new());
    let enqueuer = Enqueuer::new(queue.clone());

    let scheduler = Arc::new(ProductionScheduler::new(
        store.clone(),
        enqueuer.clone(),
        SchedulerConfig {
            interval: DAY,
            ..Default::default()
        },
    ));
    let notifications = queue.subscribe(SERIES_CREATED_CHANNEL).await.unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.listen(notifications, shutdown_rx).await })
    };

    SeriesLauncher::new(store.clone(), enqueuer)
        .launch(&series)
        .await
        .unwrap();

    let videos = store.videos_for_series(series.id);
    assert_eq!(videos.len(), 2);
    assert!(videos.iter().all(|v| v.status == VideoStatus::Pending));
    assert_eq!(queue.len(QUEUE_VIDEO_TITLE).await.unwrap(), 2);

    // No second batch on day one.
    tokio::time::sleep(DAY - Duration::from_secs(60)).await;
    assert_eq!(scheduler.active_timers(), vec![series.id]);
    assert_eq!(store.videos_for_series(series.id).len(), 2);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(store.videos_for_series(series.id).len(), 4);
    assert_eq!(queue.len(QUEUE_VIDEO_TITLE).await.unwrap(), 4);

    shutdown_tx.send(true).unwrap();
    runner.await.unwrap().unwrap();
}

/// Store whose first `create_pending_video` call fails.
struct FlakyStore {
    inner: MemoryStore,
    creates: AtomicUsize,
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn get_series(&self, id: SeriesId) -> StoreResult<Series> {
        self.inner.get_series(id).await
    }

    async fn get_video(&self, id: VideoId) -> StoreResult<Video> {
        self.inner.get_video(id).await
    }

    async fn list_sibling_titles(
        &self,
        series_id: SeriesId,
        exclude: VideoId,
    ) -> StoreResult<Vec<String>> {
        self.inner.list_sibling_titles(series_id, exclude).await
    }

    async fn create_pending_video(&self, series_id: SeriesId) -> StoreResult<Video> {
        if self.creates.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::unavailable("connection reset"));
        }
        self.inner.create_pending_video(series_id).await
    }

    async fn set_status(&self, id: VideoId, status: VideoStatus) -> StoreResult<()> {
        self.inner.set_status(id, status).await
    }

    async fn set_title(&self, id: VideoId, title: &str) -> StoreResult<()> {
        self.inner.set_title(id, title).await
    }

    async fn set_script(&self, id: VideoId, script: &str) -> StoreResult<()> {
        self.inner.set_script(id, script).await
    }

    async fn list_scenes(&self, id: VideoId) -> StoreResult<Vec<VideoScene>> {
        self.inner.list_scenes(id).await
    }

    async fn save_scenes(&self, id: VideoId, scenes: &[NewScene]) -> StoreResult<Vec<VideoScene>> {
        self.inner.save_scenes(id, scenes).await
    }
}

#[tokio::test]
async fn test_failed_unit_is_skipped() {
    let inner = MemoryStore::new();
    inner.insert_series(Series::new(SeriesId(2), 7, "Rivers", "", 3));
    let store = FlakyStore {
        inner,
        creates: AtomicUsize::new(0),
    };
    let queue = Arc::new(MemoryQueue::new());

    let report = produce_batch(&store, &Enqueuer::new(queue.clone()), SeriesId(2), 3).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.enqueued, 2);
    assert_eq!(store.inner.videos_for_series(SeriesId(2)).len(), 2);
    assert_eq!(queue.len(QUEUE_VIDEO_TITLE).await.unwrap(), 2);
}
