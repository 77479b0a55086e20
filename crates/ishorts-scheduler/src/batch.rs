//! Batch production of pending videos.

use metrics::counter;
use tracing::{info, warn};

use ishorts_models::{SeriesId, VideoId};
use ishorts_queue::{Enqueuer, TaskPayload, TitleTask};
use ishorts_store::JobStore;

/// Outcome of one batch. `failed` counts units skipped after an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub created: Vec<VideoId>,
    pub enqueued: usize,
    pub failed: usize,
}

/// Create `count` pending videos for a series and queue a title task for
/// each.
///
/// Units are independent: a failed row insert or push is logged and the
/// loop moves on. A video whose push failed stays `pending` with no task.
pub async fn produce_batch(
    store: &dyn JobStore,
    enqueuer: &Enqueuer,
    series_id: SeriesId,
    count: i32,
) -> BatchReport {
    let mut report = BatchReport::default();

    for unit in 1..=count {
        let video = match store.create_pending_video(series_id).await {
            Ok(video) => video,
            Err(e) => {
                warn!(series_id = %series_id, unit, error = %e, "Failed to create pending video");
                report.failed += 1;
                continue;
            }
        };
        report.created.push(video.id);

        if let Err(e) = enqueuer.enqueue_task(&TitleTask::new(video.id)).await {
            warn!(
                series_id = %series_id,
                video_id = %video.id,
                error = %e,
                "Failed to enqueue title task"
            );
            report.failed += 1;
            continue;
        }
        report.enqueued += 1;
    }

    counter!("ishorts_scheduler_videos_created_total").increment(report.created.len() as u64);
    counter!("ishorts_scheduler_batch_failures_total").increment(report.failed as u64);
    info!(
        series_id = %series_id,
        created = report.created.len(),
        enqueued = report.enqueued,
        failed = report.failed,
        "Produced batch"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ishorts_models::Series;
    use ishorts_queue::{MemoryQueue, QUEUE_VIDEO_TITLE};
    use ishorts_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_batch_creates_and_enqueues() {
        let store = MemoryStore::new();
        store.insert_series(Series::new(SeriesId(5), 1, "Tides", "", 3));
        let queue = Arc::new(MemoryQueue::new());
        let enqueuer = Enqueuer::new(queue.clone());

        let report = produce_batch(&store, &enqueuer, SeriesId(5), 3).await;

        assert_eq!(report.created.len(), 3);
        assert_eq!(report.enqueued, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(queue.peek(QUEUE_VIDEO_TITLE).len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_series_fails_every_unit() {
        let store = MemoryStore::new();
        let queue = Arc::new(MemoryQueue::new());
        let enqueuer = Enqueuer::new(queue.clone());

        let report = produce_batch(&store, &enqueuer, SeriesId(404), 2).await;

        assert!(report.created.is_empty());
        assert_eq!(report.failed, 2);
        assert!(queue.peek(QUEUE_VIDEO_TITLE).is_empty());
    }
}
