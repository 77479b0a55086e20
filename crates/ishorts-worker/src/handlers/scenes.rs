//! Scene stage.

use async_trait::async_trait;
use tracing::Instrument;

use ishorts_models::{validate_scene_set, NewScene, Series, Stage, VideoStatus};
use ishorts_queue::{decode, SceneTask};

use super::StageContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::processor::TaskHandler;

/// Breaks a titled video into scenes and writes a generation prompt for each.
///
/// Scene sets are immutable: a video that already has scenes is left
/// untouched.
pub struct SceneStage {
    ctx: StageContext,
}

impl SceneStage {
    pub fn new(ctx: StageContext) -> Self {
        Self { ctx }
    }

    async fn run(&self, logger: &TaskLogger) -> WorkerResult<()> {
        let ctx = &self.ctx;
        let id = logger.video_id();

        let video = ctx.store.get_video(id).await?;
        let Some(title) = video.title() else {
            logger.log_warning("video has no title");
            if let Err(e) = ctx.set_status(id, VideoStatus::FailedScenesNoTitle).await {
                logger.log_error(&format!("could not record missing title: {}", e));
            }
            return Ok(());
        };

        let existing = ctx.store.list_scenes(id).await?;
        if !existing.is_empty() {
            logger.log_warning(&format!(
                "video already has {} scenes, ignoring task",
                existing.len()
            ));
            return Ok(());
        }

        let series = ctx.store.get_series(video.series_id).await?;
        logger.log_start(&format!("title \"{}\"", title));

        ctx.set_status(id, Stage::Scenes.processing_status()).await?;

        let scenes = match self.generate_scenes(&series, title).await {
            Ok(scenes) => scenes,
            Err(e) => return Err(ctx.fail(logger, VideoStatus::FailedScenes, e).await),
        };

        if let Err(e) = ctx.store.save_scenes(id, &scenes).await {
            return Err(ctx.fail(logger, VideoStatus::FailedSaveScenes, e.into()).await);
        }
        logger.log_progress(&format!("saved {} scenes", scenes.len()));

        ctx.advance(logger, Stage::Script).await?;
        logger.log_completion("scenes ready");
        Ok(())
    }

    async fn generate_scenes(
        &self,
        series: &Series,
        title: &str,
    ) -> WorkerResult<Vec<NewScene>> {
        let ctx = &self.ctx;
        let style = ctx.config.scene_style.as_str();

        let outlines = ctx
            .generate(
                Stage::Scenes,
                ctx.generator.generate_scene_breakdown(series, title),
            )
            .await?;

        let mut scenes = Vec::with_capacity(outlines.len());
        for (idx, outline) in outlines.iter().enumerate() {
            let prompt = ctx
                .generate(
                    Stage::Scenes,
                    ctx.generator.generate_scene_prompt(series, style, outline),
                )
                .await?;

            scenes.push(NewScene {
                scene_number: idx as i32 + 1,
                description: outline.description.clone(),
                prompt,
                duration: outline.duration,
            });
        }

        validate_scene_set(&scenes).map_err(|e| WorkerError::invalid_content(e.to_string()))?;
        Ok(scenes)
    }
}

#[async_trait]
impl TaskHandler for SceneStage {
    async fn handle(&self, payload: &str) -> WorkerResult<()> {
        let task: SceneTask = decode(payload)?;
        let logger = TaskLogger::new(task.video_id, Stage::Scenes);
        self.run(&logger).instrument(logger.create_span()).await
    }
}
