//! Title stage.

use async_trait::async_trait;
use tracing::Instrument;

use ishorts_models::{Stage, VideoStatus};
use ishorts_queue::{decode, TitleTask};

use super::StageContext;
use crate::error::WorkerResult;
use crate::logging::TaskLogger;
use crate::processor::TaskHandler;

/// Generates a title distinct from the series' existing titles.
pub struct TitleStage {
    ctx: StageContext,
}

impl TitleStage {
    pub fn new(ctx: StageContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, logger: &TaskLogger) -> WorkerResult<()> {
        let ctx = &self.ctx;
        let id = logger.video_id();

        let video = ctx.store.get_video(id).await?;
        let series = ctx.store.get_series(video.series_id).await?;
        let existing = ctx.store.list_sibling_titles(series.id, id).await?;
        logger.log_start(&format!(
            "series {} with {} existing titles",
            series.id,
            existing.len()
        ));

        ctx.set_status(id, Stage::Title.processing_status()).await?;

        let title = match ctx
            .generate(Stage::Title, ctx.generator.generate_title(&series, &existing))
            .await
        {
            Ok(title) => title,
            Err(e) => return Err(ctx.fail(logger, VideoStatus::FailedTitle, e).await),
        };

        if let Err(e) = ctx.store.set_title(id, &title).await {
            return Err(ctx.fail(logger, VideoStatus::FailedTitle, e.into()).await);
        }
        logger.log_progress(&format!("title saved: {}", title));

        ctx.advance(logger, Stage::Scenes).await?;
        logger.log_completion("title ready");
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for TitleStage {
    async fn handle(&self, payload: &str) -> WorkerResult<()> {
        let task: TitleTask = decode(payload)?;
        let logger = TaskLogger::new(task.video_id, Stage::Title);
        self.run(&logger).instrument(logger.create_span()).await
    }
}
