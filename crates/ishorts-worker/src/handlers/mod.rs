//! Pipeline stage handlers.
//!
//! Every stage follows the same template: load the video and its context,
//! mark it `processing_*`, call the generator, persist the output, then
//! mark it `pending_<next>` and queue the next task. Failures write the
//! stage's `failed_*` status and surface as a handler error.

mod render;
mod scenes;
mod script;
mod title;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use ishorts_llm::{ContentGenerator, LlmResult};
use ishorts_models::{Stage, VideoId, VideoStatus};
use ishorts_queue::{
    Enqueuer, RenderTask, SceneTask, ScriptTask, TaskPayload, TitleTask, QUEUE_SCENE_GENERATION,
    QUEUE_VIDEO_RENDER, QUEUE_VIDEO_SCRIPT, QUEUE_VIDEO_TITLE,
};
use ishorts_store::JobStore;

use crate::config::StageConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::metrics;
use crate::processor::Processor;

pub use render::RenderStage;
pub use scenes::SceneStage;
pub use script::ScriptStage;
pub use title::TitleStage;

/// Collaborators shared by all stage handlers.
#[derive(Clone)]
pub struct StageContext {
    pub store: Arc<dyn JobStore>,
    pub generator: Arc<dyn ContentGenerator>,
    pub enqueuer: Enqueuer,
    pub config: StageConfig,
}

impl StageContext {
    pub fn new(
        store: Arc<dyn JobStore>,
        generator: Arc<dyn ContentGenerator>,
        enqueuer: Enqueuer,
        config: StageConfig,
    ) -> Self {
        Self {
            store,
            generator,
            enqueuer,
            config,
        }
    }

    /// Run one generation call under the configured deadline.
    async fn generate<T, F>(&self, stage: Stage, call: F) -> WorkerResult<T>
    where
        F: Future<Output = LlmResult<T>> + Send,
        T: Send,
    {
        let started = Instant::now();
        let result = tokio::time::timeout(self.config.generation_timeout, call).await;
        metrics::record_generation_duration(stage, started.elapsed().as_secs_f64());

        match result {
            Ok(output) => Ok(output?),
            Err(_) => Err(WorkerError::GenerationTimeout {
                stage,
                secs: self.config.generation_timeout.as_secs(),
            }),
        }
    }

    async fn set_status(&self, id: VideoId, status: VideoStatus) -> WorkerResult<()> {
        self.store.set_status(id, status).await?;
        Ok(())
    }

    /// Write a failure status and hand back the error that caused it.
    ///
    /// A store error while writing the status is logged; the original error
    /// is what the handler reports.
    async fn fail(&self, logger: &TaskLogger, status: VideoStatus, err: WorkerError) -> WorkerError {
        logger.log_error(&format!("{} ({})", err, status));
        metrics::record_stage_failure(logger.stage(), status.as_str());

        if let Err(e) = self.store.set_status(logger.video_id(), status).await {
            logger.log_error(&format!("could not record status {}: {}", status, e));
        }
        err
    }

    /// Mark the video pending for `next`, then queue its task.
    ///
    /// The status goes first so a fast consumer never sees a stale one. A
    /// failed status write is logged and the task is still queued; the next
    /// stage overwrites the status anyway. If the push fails the status
    /// becomes `failed_queue_<next>` and saved outputs are kept.
    async fn advance(&self, logger: &TaskLogger, next: Stage) -> WorkerResult<()> {
        let id = logger.video_id();
        if let Err(e) = self.set_status(id, next.pending_status()).await {
            logger.log_error(&format!(
                "could not record status {}: {}",
                next.pending_status(),
                e
            ));
        }

        let queued = match next {
            Stage::Title => self.enqueuer.enqueue_task(&TitleTask::new(id)).await,
            Stage::Scenes => self.enqueuer.enqueue_task(&SceneTask::new(id)).await,
            Stage::Script => self.enqueuer.enqueue_task(&ScriptTask::new(id)).await,
            Stage::Render => self.enqueuer.enqueue_task(&RenderTask::new(id)).await,
        };

        if let Err(e) = queued {
            let err = WorkerError::from(e);
            return Err(match next.failed_queue_status() {
                Some(status) => self.fail(logger, status, err).await,
                None => err,
            });
        }

        logger.log_progress(&format!("queued {} task", next));
        Ok(())
    }

    async fn complete(&self, logger: &TaskLogger) -> WorkerResult<()> {
        self.set_status(logger.video_id(), VideoStatus::Complete).await?;
        metrics::record_video_completed();
        Ok(())
    }
}

/// Register all four stage handlers on their queues.
pub fn register_stages(processor: &mut Processor, ctx: StageContext) {
    processor.register(QUEUE_VIDEO_TITLE, Arc::new(TitleStage::new(ctx.clone())));
    processor.register(QUEUE_SCENE_GENERATION, Arc::new(SceneStage::new(ctx.clone())));
    processor.register(QUEUE_VIDEO_SCRIPT, Arc::new(ScriptStage::new(ctx.clone())));
    processor.register(QUEUE_VIDEO_RENDER, Arc::new(RenderStage::new(ctx)));
}
