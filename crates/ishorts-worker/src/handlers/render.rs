//! Render stage.
//!
//! Rendering is simulated: the stage holds the video in `rendering` for
//! the configured duration and then completes it.

use async_trait::async_trait;
use tracing::Instrument;

use ishorts_models::Stage;
use ishorts_queue::{decode, RenderTask};

use super::StageContext;
use crate::error::WorkerResult;
use crate::logging::TaskLogger;
use crate::processor::TaskHandler;

pub struct RenderStage {
    ctx: StageContext,
}

impl RenderStage {
    pub fn new(ctx: StageContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, logger: &TaskLogger) -> WorkerResult<()> {
        let ctx = &self.ctx;
        let id = logger.video_id();

        ctx.store.get_video(id).await?;
        logger.log_start("rendering");
        ctx.set_status(id, Stage::Render.processing_status()).await?;

        tokio::time::sleep(ctx.config.render_duration).await;

        ctx.complete(logger).await?;
        logger.log_completion("video complete");
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for RenderStage {
    async fn handle(&self, payload: &str) -> WorkerResult<()> {
        let task: RenderTask = decode(payload)?;
        let logger = TaskLogger::new(task.video_id, Stage::Render);
        self.run(&logger).instrument(logger.create_span()).await
    }
}
