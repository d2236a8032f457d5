//! Stage 1: denoise the source video's audio track.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_media::{Denoiser, TempArtifact};
use autocut_models::{ArtifactKind, BaseId, StageKind};

use crate::decision_log::DecisionLog;
use crate::error::StageResult;
use crate::logging::StageLogger;
use crate::stage::Stage;
use crate::stages::require_input;

/// `<source>/<id>.mp4` -> `denoised/<id>_clean.wav` + `denoised/<id>.mp4`.
///
/// The extracted `<id>_raw.wav` is removed on every exit path.
pub struct DenoiseStage {
    source_dir: PathBuf,
    output_dir: PathBuf,
    model: PathBuf,
    denoiser: Arc<dyn Denoiser>,
    logger: StageLogger,
    decisions: DecisionLog,
}

impl DenoiseStage {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        model: impl Into<PathBuf>,
        denoiser: Arc<dyn Denoiser>,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            model: model.into(),
            denoiser,
            logger: StageLogger::new(StageKind::Denoise),
            decisions,
        }
    }
}

#[async_trait]
impl Stage for DenoiseStage {
    fn kind(&self) -> StageKind {
        StageKind::Denoise
    }

    fn logger(&self) -> &StageLogger {
        &self.logger
    }

    fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    fn input_dir(&self) -> &Path {
        &self.source_dir
    }

    fn input_suffix(&self) -> &'static str {
        ArtifactKind::Video.suffix()
    }

    async fn execute(&self, id: &BaseId) -> StageResult<()> {
        let input = ArtifactKind::Video.path_in(&self.source_dir, id);
        require_input(&input)?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let raw = TempArtifact::new(ArtifactKind::RawAudio.path_in(&self.output_dir, id));
        let clean = ArtifactKind::CleanAudio.path_in(&self.output_dir, id);
        let output = ArtifactKind::Video.path_in(&self.output_dir, id);

        self.denoiser.extract_audio(&input, raw.path()).await?;
        self.logger.log_progress(id, "Audio extracted");

        self.denoiser.reduce_noise(raw.path(), &clean, &self.model).await?;
        self.logger.log_progress(id, "Noise reduction applied");

        self.denoiser.remux(&clean, &input, &output).await?;
        Ok(())
    }
}
