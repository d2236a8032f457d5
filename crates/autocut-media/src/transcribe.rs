//! Speech transcription through the whisper.cpp CLI.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use autocut_models::{validate_transcript, Segment, TextRule, Transcript};

use crate::command::run_captured;
use crate::error::{MediaError, MediaResult};

/// Speech-recognition capability.
///
/// Implementations must return a transcript that already passed
/// validation with [`TextRule::NonEmpty`]; anything else is an error, never
/// a partial result.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, wav: &Path) -> MediaResult<Transcript>;
}

const BEAM_SIZE: u32 = 5;

/// [`SpeechTranscriber`] that shells out to whisper.cpp (`whisper-cli`).
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    binary: String,
    model: PathBuf,
    timeout_secs: Option<u64>,
}

impl WhisperCliTranscriber {
    pub fn new(binary: impl Into<String>, model: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Arguments for one run writing JSON to `<output_prefix>.json`.
    pub fn build_args(&self, wav: &Path, output_prefix: &Path) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model.to_string_lossy().to_string(),
            "-f".to_string(),
            wav.to_string_lossy().to_string(),
            "-bs".to_string(),
            BEAM_SIZE.to_string(),
            "-oj".to_string(),
            "-of".to_string(),
            output_prefix.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechTranscriber for WhisperCliTranscriber {
    async fn transcribe(&self, wav: &Path) -> MediaResult<Transcript> {
        if !wav.exists() {
            return Err(MediaError::FileNotFound(wav.to_path_buf()));
        }
        if !self.model.exists() {
            return Err(MediaError::model_not_found(self.model.display().to_string()));
        }
        which::which(&self.binary).map_err(|_| MediaError::WhisperNotFound(self.binary.clone()))?;

        info!("Starting transcription of {}", wav.display());

        let work_dir = tempfile::tempdir()?;
        let prefix = work_dir.path().join("transcript");
        let args = self.build_args(wav, &prefix);
        debug!("Running whisper: {} {}", self.binary, args.join(" "));

        let mut command = Command::new(&self.binary);
        command.args(&args);
        let output = run_captured(&mut command, self.timeout_secs).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::WhisperFailed(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        let json = tokio::fs::read(prefix.with_extension("json")).await?;
        let transcript = parse_whisper_json(&json)?;
        validate_transcript(&transcript, TextRule::NonEmpty)?;

        info!(
            segments = transcript.len(),
            "Successfully transcribed {}",
            wav.display()
        );
        Ok(transcript)
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    /// Milliseconds
    from: u64,
    /// Milliseconds
    to: u64,
}

/// Map whisper.cpp JSON output to a transcript with trimmed text.
pub fn parse_whisper_json(json: &[u8]) -> MediaResult<Transcript> {
    let output: WhisperOutput = serde_json::from_slice(json)?;
    let segments = output
        .transcription
        .into_iter()
        .map(|seg| {
            Segment::new(
                seg.offsets.from as f64 / 1000.0,
                seg.offsets.to as f64 / 1000.0,
                seg.text.trim(),
            )
        })
        .collect();
    Ok(Transcript::new(segments))
}
