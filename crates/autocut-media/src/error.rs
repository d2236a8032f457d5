//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use autocut_models::ValidationError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while invoking an external media capability.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("whisper binary not found: {0}")]
    WhisperNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Transcription failed: {0}")]
    WhisperFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid media metadata: {0}")]
    Metadata(String),

    #[error("Transcript failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("No segments fall inside the source duration")]
    NoSegmentsInBounds,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create a metadata error.
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }

    /// Last line of captured stderr, if any.
    pub fn stderr_tail(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr: Some(s), .. }
            | MediaError::FfprobeFailed { stderr: Some(s), .. } => s.lines().last(),
            _ => None,
        }
    }
}
