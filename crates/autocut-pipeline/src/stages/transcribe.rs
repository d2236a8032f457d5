//! Stage 2: speech to transcript.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_media::{write_atomic, SpeechTranscriber};
use autocut_models::{ArtifactKind, BaseId, StageKind};

use crate::decision_log::DecisionLog;
use crate::error::StageResult;
use crate::logging::StageLogger;
use crate::stage::Stage;
use crate::stages::require_input;

/// `denoised/<id>_clean.wav` -> `transcripts/<id>_transcript.json`
pub struct TranscribeStage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    transcriber: Arc<dyn SpeechTranscriber>,
    logger: StageLogger,
    decisions: DecisionLog,
}

impl TranscribeStage {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        transcriber: Arc<dyn SpeechTranscriber>,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            transcriber,
            logger: StageLogger::new(StageKind::Transcribe),
            decisions,
        }
    }
}

#[async_trait]
impl Stage for TranscribeStage {
    fn kind(&self) -> StageKind {
        StageKind::Transcribe
    }

    fn logger(&self) -> &StageLogger {
        &self.logger
    }

    fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    fn input_suffix(&self) -> &'static str {
        ArtifactKind::CleanAudio.suffix()
    }

    async fn execute(&self, id: &BaseId) -> StageResult<()> {
        let audio = ArtifactKind::CleanAudio.path_in(&self.input_dir, id);
        require_input(&audio)?;

        // The adapter validates before returning.
        let transcript = self.transcriber.transcribe(&audio).await?;
        self.logger
            .log_progress(id, &format!("Transcribed {} segments", transcript.len()));

        let output = ArtifactKind::Transcript.path_in(&self.output_dir, id);
        write_atomic(&output, transcript.to_json_pretty()?).await?;
        Ok(())
    }
}
