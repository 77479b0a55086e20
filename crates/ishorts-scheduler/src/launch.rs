//! Immediate first batch at series creation.

use std::sync::Arc;

use tracing::info;

use ishorts_models::Series;
use ishorts_queue::{publish_series_created, Enqueuer, SeriesCreated};
use ishorts_store::JobStore;

use crate::batch::{produce_batch, BatchReport};
use crate::error::SchedulerResult;

/// Starts production for a newly created series.
///
/// The first batch is produced right away; the scheduler's recurring timer
/// takes over one interval later, so day one is not produced twice.
pub struct SeriesLauncher {
    store: Arc<dyn JobStore>,
    enqueuer: Enqueuer,
}

impl SeriesLauncher {
    pub fn new(store: Arc<dyn JobStore>, enqueuer: Enqueuer) -> Self {
        Self { store, enqueuer }
    }

    /// Produce the first batch, then announce the series to the scheduler.
    pub async fn launch(&self, series: &Series) -> SchedulerResult<BatchReport> {
        series.check()?;

        let report = produce_batch(
            self.store.as_ref(),
            &self.enqueuer,
            series.id,
            series.posts_per_day,
        )
        .await;

        let message = SeriesCreated {
            series_id: series.id,
            posts_per_day: series.posts_per_day,
        };
        publish_series_created(self.enqueuer.backend().as_ref(), &message).await?;

        info!(
            series_id = %series.id,
            created = report.created.len(),
            "Series launched"
        );
        Ok(report)
    }
}
