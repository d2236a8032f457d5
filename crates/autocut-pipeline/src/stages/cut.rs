//! Stage 4: cut the denoised video down to the retained segments.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_media::MediaCutter;
use autocut_models::{ArtifactKind, BaseId, StageKind, TextRule};

use crate::decision_log::DecisionLog;
use crate::error::StageResult;
use crate::logging::StageLogger;
use crate::stage::Stage;
use crate::stages::{read_transcript, require_input};

/// `edited/<id>_llm_cleaned.json` + `denoised/<id>.mp4`
/// -> `edited_segments/<id>_video_clean.mp4`
pub struct CutStage {
    transcript_dir: PathBuf,
    video_dir: PathBuf,
    output_dir: PathBuf,
    cutter: Arc<dyn MediaCutter>,
    logger: StageLogger,
    decisions: DecisionLog,
}

impl CutStage {
    pub fn new(
        transcript_dir: impl Into<PathBuf>,
        video_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        cutter: Arc<dyn MediaCutter>,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            transcript_dir: transcript_dir.into(),
            video_dir: video_dir.into(),
            output_dir: output_dir.into(),
            cutter,
            logger: StageLogger::new(StageKind::Cut),
            decisions,
        }
    }
}

#[async_trait]
impl Stage for CutStage {
    fn kind(&self) -> StageKind {
        StageKind::Cut
    }

    fn logger(&self) -> &StageLogger {
        &self.logger
    }

    fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    fn input_dir(&self) -> &Path {
        &self.transcript_dir
    }

    fn input_suffix(&self) -> &'static str {
        ArtifactKind::CleanedTranscript.suffix()
    }

    async fn execute(&self, id: &BaseId) -> StageResult<()> {
        let transcript_path = ArtifactKind::CleanedTranscript.path_in(&self.transcript_dir, id);
        let video = ArtifactKind::Video.path_in(&self.video_dir, id);
        let transcript = read_transcript(&transcript_path, TextRule::Any).await?;
        require_input(&video)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = ArtifactKind::CutVideo.path_in(&self.output_dir, id);

        let plan = self.cutter.cut(&video, &transcript.segments, &output).await?;
        if !plan.skipped.is_empty() {
            self.logger.log_warning(
                id,
                &format!("{} segment(s) outside the source were skipped", plan.skipped.len()),
            );
        }
        Ok(())
    }
}
