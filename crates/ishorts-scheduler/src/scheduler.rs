//! Recurring per-series production timers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use ishorts_models::{Series, SeriesId};
use ishorts_queue::{decode, Enqueuer, NotificationStream, SeriesCreated, SERIES_CREATED_CHANNEL};
use ishorts_store::JobStore;

use crate::batch::produce_batch;
use crate::config::{SchedulerConfig, MAX_INTERVAL};
use crate::error::{SchedulerError, SchedulerResult};

/// Installs and owns one recurring timer per series.
pub struct ProductionScheduler {
    store: Arc<dyn JobStore>,
    enqueuer: Enqueuer,
    config: SchedulerConfig,
    timers: Mutex<HashMap<SeriesId, JoinHandle<()>>>,
}

impl ProductionScheduler {
    pub fn new(store: Arc<dyn JobStore>, enqueuer: Enqueuer, config: SchedulerConfig) -> Self {
        Self {
            store,
            enqueuer,
            config,
            timers: Mutex::new(HashMap::new()),
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<SeriesId, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to `series_created` and install timers until `shutdown`
    /// flips to true.
    ///
    /// A dropped subscription is reopened after a back-off. Installed timers
    /// keep running meanwhile; they are only stopped on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerResult<()> {
        loop {
            match self
                .enqueuer
                .backend()
                .subscribe(SERIES_CREATED_CHANNEL)
                .await
            {
                Ok(notifications) => {
                    info!(channel = SERIES_CREATED_CHANNEL, "Scheduler subscribed");
                    match self.listen(notifications, shutdown.clone()).await {
                        Err(SchedulerError::NotificationsClosed) => {
                            warn!(
                                active_timers = self.timers().len(),
                                "Notification stream ended, resubscribing"
                            );
                        }
                        result => return result,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to subscribe to notifications");
                }
            }

            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => {
                    self.shutdown();
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.resubscribe_backoff) => {}
            }
        }
    }

    /// Consume an already-open notification stream.
    ///
    /// Returns `Ok` after stopping every timer once `shutdown` flips, or
    /// `NotificationsClosed` with the timers left running if the stream ends.
    pub async fn listen(
        &self,
        mut notifications: NotificationStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> SchedulerResult<()> {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                message = notifications.next() => match message {
                    Some(payload) => self.handle_notification(&payload),
                    None => return Err(SchedulerError::NotificationsClosed),
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_notification(&self, payload: &str) {
        let message: SeriesCreated = match decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(payload, error = %e, "Ignoring malformed series_created message");
                return;
            }
        };

        if let Err(e) = self.install(message) {
            warn!(series_id = %message.series_id, error = %e, "Timer not installed");
        }
    }

    /// Start producing `posts_per_day` videos for a series every interval.
    ///
    /// The first batch fires one full interval after installation. A second
    /// install for the same series replaces the earlier timer.
    pub fn install(&self, message: SeriesCreated) -> SchedulerResult<()> {
        let SeriesCreated {
            series_id,
            posts_per_day,
        } = message;
        if !Series::posts_per_day_in_range(posts_per_day) {
            return Err(SchedulerError::InvalidPostsPerDay(posts_per_day));
        }
        let period = self.config.interval;
        if period.is_zero() || period > MAX_INTERVAL {
            return Err(SchedulerError::ConfigError(format!(
                "interval {:?} is outside (0, {:?}]",
                period, MAX_INTERVAL
            )));
        }

        let first_fire = Instant::now().checked_add(period).ok_or_else(|| {
            SchedulerError::ConfigError(format!("interval {:?} is too long", period))
        })?;

        let store = Arc::clone(&self.store);
        let enqueuer = self.enqueuer.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_fire, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(series_id = %series_id, "Production timer fired");
                produce_batch(store.as_ref(), &enqueuer, series_id, posts_per_day).await;
            }
        });

        if let Some(previous) = self.timers().insert(series_id, handle) {
            previous.abort();
            info!(series_id = %series_id, posts_per_day, "Replaced production timer");
        } else {
            info!(
                series_id = %series_id,
                posts_per_day,
                interval_secs = period.as_secs(),
                "Installed production timer"
            );
        }
        Ok(())
    }

    /// Stop a series' timer. Returns whether one was running.
    pub fn cancel(&self, series_id: SeriesId) -> bool {
        match self.timers().remove(&series_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Series with an installed timer.
    pub fn active_timers(&self) -> Vec<SeriesId> {
        let mut ids: Vec<SeriesId> = self.timers().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Abort every timer.
    pub fn shutdown(&self) {
        let timers: Vec<(SeriesId, JoinHandle<()>)> = self.timers().drain().collect();
        for (_, handle) in &timers {
            handle.abort();
        }
        if !timers.is_empty() {
            info!(count = timers.len(), "Stopped production timers");
        }
    }
}

/// Resolves once `shutdown` is true or its sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

impl Drop for ProductionScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers().drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use ishorts_queue::{MemoryQueue, PoppedTask, QueueBackend, QueueResult, QUEUE_VIDEO_TITLE};
    use ishorts_store::MemoryStore;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn scheduler() -> (ProductionScheduler, Arc<MemoryStore>, Arc<MemoryQueue>) {
        let store = Arc::new(MemoryStore::new());
        store.insert_series(Series::new(SeriesId(1), 1, "Tides", "", 2));
        store.insert_series(Series::new(SeriesId(2), 1, "Reefs", "", 1));
        let queue = Arc::new(MemoryQueue::new());
        let scheduler = ProductionScheduler::new(
            store.clone(),
            Enqueuer::new(queue.clone()),
            SchedulerConfig {
                interval: HOUR,
                ..Default::default()
            },
        );
        (scheduler, store, queue)
    }

    fn created(series_id: i64, posts_per_day: i32) -> SeriesCreated {
        SeriesCreated {
            series_id: SeriesId(series_id),
            posts_per_day,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_one_interval() {
        let (scheduler, store, queue) = scheduler();
        scheduler.install(created(1, 2)).unwrap();

        tokio::time::sleep(HOUR - Duration::from_secs(1)).await;
        assert!(store.videos_for_series(SeriesId(1)).is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.videos_for_series(SeriesId(1)).len(), 2);
        assert_eq!(queue.peek(QUEUE_VIDEO_TITLE).len(), 2);

        tokio::time::sleep(HOUR).await;
        assert_eq!(store.videos_for_series(SeriesId(1)).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinstall_replaces_timer() {
        let (scheduler, store, _queue) = scheduler();
        scheduler.install(created(1, 2)).unwrap();
        scheduler.install(created(1, 1)).unwrap();
        assert_eq!(scheduler.active_timers(), vec![SeriesId(1)]);

        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(store.videos_for_series(SeriesId(1)).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_are_independent_per_series() {
        let (scheduler, store, _queue) = scheduler();
        scheduler.install(created(1, 2)).unwrap();
        scheduler.install(created(2, 1)).unwrap();
        assert!(scheduler.cancel(SeriesId(1)));
        assert!(!scheduler.cancel(SeriesId(1)));

        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert!(store.videos_for_series(SeriesId(1)).is_empty());
        assert_eq!(store.videos_for_series(SeriesId(2)).len(), 1);
    }

    #[tokio::test]
    async fn test_install_rejects_out_of_range_posts() {
        let (scheduler, _store, _queue) = scheduler();
        assert!(matches!(
            scheduler.install(created(1, 0)),
            Err(SchedulerError::InvalidPostsPerDay(0))
        ));
        assert!(matches!(
            scheduler.install(created(1, 4)),
            Err(SchedulerError::InvalidPostsPerDay(4))
        ));
        assert!(scheduler.active_timers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_installs_from_notifications() {
        let (scheduler, _store, queue) = scheduler();
        let scheduler = Arc::new(scheduler);
        let notifications = queue.subscribe(SERIES_CREATED_CHANNEL).await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.listen(notifications, shutdown_rx).await })
        };

        queue
            .publish(SERIES_CREATED_CHANNEL, "not json".to_string())
            .await
            .unwrap();
        queue
            .publish(
                SERIES_CREATED_CHANNEL,
                r#"{"series_id":2,"posts_per_day":1}"#.to_string(),
            )
            .await
            .unwrap();

        for _ in 0..10 {
            if !scheduler.active_timers().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(scheduler.active_timers(), vec![SeriesId(2)]);

        shutdown_tx.send(true).unwrap();
        runner.await.unwrap().unwrap();
        assert!(scheduler.active_timers().is_empty());
    }

    #[tokio::test]
    async fn test_stream_end_keeps_timers() {
        let (scheduler, _store, _queue) = scheduler();
        scheduler.install(created(1, 2)).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let result = scheduler
            .listen(Box::pin(futures::stream::empty::<String>()), shutdown_rx)
            .await;

        assert!(matches!(result, Err(SchedulerError::NotificationsClosed)));
        assert_eq!(scheduler.active_timers(), vec![SeriesId(1)]);
    }

    /// Memory queue whose first subscription ends immediately.
    struct DroppedSubscription {
        inner: Arc<MemoryQueue>,
        subscribes: AtomicUsize,
    }

    #[async_trait]
    impl QueueBackend for DroppedSubscription {
        async fn push(&self, queue: &str, payload: String) -> QueueResult<()> {
            self.inner.push(queue, payload).await
        }

        async fn pop(&self, queues: &[&str], timeout: Duration) -> QueueResult<Option<PoppedTask>> {
            self.inner.pop(queues, timeout).await
        }

        async fn len(&self, queue: &str) -> QueueResult<u64> {
            self.inner.len(queue).await
        }

        async fn publish(&self, channel: &str, payload: String) -> QueueResult<()> {
            self.inner.publish(channel, payload).await
        }

        async fn subscribe(&self, channel: &str) -> QueueResult<NotificationStream> {
            if self.subscribes.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(Box::pin(futures::stream::empty::<String>()));
            }
            self.inner.subscribe(channel).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resubscribes_after_stream_end() {
        let store = Arc::new(MemoryStore::new());
        store.insert_series(Series::new(SeriesId(1), 1, "Tides", "", 2));
        store.insert_series(Series::new(SeriesId(2), 1, "Reefs", "", 1));
        let queue = Arc::new(MemoryQueue::new());
        let backend = Arc::new(DroppedSubscription {
            inner: queue.clone(),
            subscribes: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(ProductionScheduler::new(
            store,
            Enqueuer::new(backend.clone()),
            SchedulerConfig {
                interval: HOUR,
                resubscribe_backoff: Duration::from_secs(1),
            },
        ));
        scheduler.install(created(1, 2)).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run(shutdown_rx).await })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.subscribes.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_timers(), vec![SeriesId(1)]);

        queue
            .publish(
                SERIES_CREATED_CHANNEL,
                r#"{"series_id":2,"posts_per_day":1}"#.to_string(),
            )
            .await
            .unwrap();
        for _ in 0..10 {
            if scheduler.active_timers().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(scheduler.active_timers(), vec![SeriesId(1), SeriesId(2)]);

        shutdown_tx.send(true).unwrap();
        runner.await.unwrap().unwrap();
        assert!(scheduler.active_timers().is_empty());
    }

    #[tokio::test]
    async fn test_install_rejects_interval_too_long() {
        let scheduler = ProductionScheduler::new(
            Arc::new(MemoryStore::new()),
            Enqueuer::new(Arc::new(MemoryQueue::new())),
            SchedulerConfig {
                interval: Duration::MAX,
                ..Default::default()
            },
        );
        assert!(matches!(
            scheduler.install(created(1, 1)),
            Err(SchedulerError::ConfigError(_))
        ));
        assert!(scheduler.active_timers().is_empty());
    }
}
