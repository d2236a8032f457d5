//! Stage 3: clean transcript text segment by segment.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_media::write_atomic;
use autocut_models::{ArtifactKind, BaseId, StageKind, TextRule, Transcript};

use crate::decision_log::DecisionLog;
use crate::error::StageResult;
use crate::logging::StageLogger;
use crate::ollama::TextCleaner;
use crate::stage::Stage;
use crate::stages::read_transcript;

/// Prompt sent for one segment.
pub fn cleaning_prompt(text: &str) -> String {
    format!(
        "Clean and improve the following transcript segment while preserving all visual markers and timing information:\n{}",
        text
    )
}

/// `transcripts/<id>_transcript.json` -> `edited/<id>_llm_cleaned.json`
///
/// Timing is kept; only text is replaced. If any segment fails, nothing is
/// written for the item.
pub struct CleanStage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    cleaner: Arc<dyn TextCleaner>,
    logger: StageLogger,
    decisions: DecisionLog,
}

impl CleanStage {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        cleaner: Arc<dyn TextCleaner>,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            cleaner,
            logger: StageLogger::new(StageKind::Clean),
            decisions,
        }
    }
}

#[async_trait]
impl Stage for CleanStage {
    fn kind(&self) -> StageKind {
        StageKind::Clean
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
        ArtifactKind::Transcript.suffix()
    }

    async fn execute(&self, id: &BaseId) -> StageResult<()> {
        let input = ArtifactKind::Transcript.path_in(&self.input_dir, id);
        let transcript = read_transcript(&input, TextRule::Any).await?;

        let total = transcript.len();
        let mut cleaned = Vec::with_capacity(total);
        for (i, seg) in transcript.segments.iter().enumerate() {
            let text = self.cleaner.clean(&cleaning_prompt(&seg.text)).await?;
            cleaned.push(seg.with_text(text.trim()));
            self.logger
                .log_progress(id, &format!("Processed segment {}/{}", i + 1, total));
        }

        let output = ArtifactKind::CleanedTranscript.path_in(&self.output_dir, id);
        write_atomic(&output, Transcript::new(cleaned).to_json_pretty()?).await?;
        Ok(())
    }
}
