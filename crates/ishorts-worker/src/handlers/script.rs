//! Script stage.

use async_trait::async_trait;
use tracing::Instrument;

use ishorts_models::{Stage, VideoStatus};
use ishorts_queue::{decode, ScriptTask};

use super::StageContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::processor::TaskHandler;

/// Writes the narrator voiceover from the title and the saved scenes.
pub struct ScriptStage {
    ctx: StageContext,
}

impl ScriptStage {
    pub fn new(ctx: StageContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, logger: &TaskLogger) -> WorkerResult<()> {
        let ctx = &self.ctx;
        let id = logger.video_id();

        let video = ctx.store.get_video(id).await?;
        let series = ctx.store.get_series(video.series_id).await?;
        let scenes = ctx.store.list_scenes(id).await?;

        let Some(title) = video.title() else {
            let err = WorkerError::precondition("video has no title");
            return Err(ctx.fail(logger, VideoStatus::FailedScript, err).await);
        };
        if scenes.is_empty() {
            let err = WorkerError::precondition("video has no scenes");
            return Err(ctx.fail(logger, VideoStatus::FailedScript, err).await);
        }
        logger.log_start(&format!("{} scenes", scenes.len()));

        ctx.set_status(id, Stage::Script.processing_status()).await?;

        let script = match ctx
            .generate(
                Stage::Script,
                ctx.generator.generate_script(&series, title, &scenes),
            )
            .await
        {
            Ok(script) => script,
            Err(e) => return Err(ctx.fail(logger, VideoStatus::FailedScript, e).await),
        };

        if let Err(e) = ctx.store.set_script(id, &script).await {
            return Err(ctx.fail(logger, VideoStatus::FailedScript, e.into()).await);
        }
        logger.log_progress(&format!("script saved ({} chars)", script.len()));

        match Stage::Script.next(ctx.config.render_enabled) {
            Some(next) => ctx.advance(logger, next).await?,
            None => ctx.complete(logger).await?,
        }
        logger.log_completion("script ready");
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for ScriptStage {
    async fn handle(&self, payload: &str) -> WorkerResult<()> {
        let task: ScriptTask = decode(payload)?;
        let logger = TaskLogger::new(task.video_id, Stage::Script);
        self.run(&logger).instrument(logger.create_span()).await
    }
}
