//! Stage error types.
//!
//! The `Display` text of every variant is what lands in the decision log,
//! so each one starts with the class prefix readers grep for.

use thiserror::Error;

use autocut_media::MediaError;
use autocut_models::ValidationError;

use crate::ollama::OllamaError;

pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Processing error: {0}")]
    Capability(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Invalid data: no segments to place on the timeline")]
    NoSegments,

    #[error("Processing error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Precondition failed: {0}")]
    Precondition(String),
}

impl StageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Short class name for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::NotFound(_) => "not_found",
            StageError::Validation(_) | StageError::Json(_) | StageError::NoSegments => "validation",
            StageError::Capability(_) | StageError::Io(_) => "capability",
            StageError::Timeout(_) => "timeout",
            StageError::Metadata(_) => "metadata",
            StageError::Precondition(_) => "precondition",
        }
    }
}

impl From<MediaError> for StageError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Timeout(secs) => {
                StageError::Timeout(format!("external process exceeded {} seconds", secs))
            }
            MediaError::FileNotFound(path) => StageError::NotFound(path.display().to_string()),
            MediaError::ModelNotFound(model) => StageError::NotFound(format!("model {}", model)),
            MediaError::Validation(v) => StageError::Validation(v),
            MediaError::Metadata(_) | MediaError::FfprobeFailed { .. } | MediaError::FfprobeNotFound => {
                StageError::Metadata(e.to_string())
            }
            other => StageError::Capability(other.to_string()),
        }
    }
}

impl From<OllamaError> for StageError {
    fn from(e: OllamaError) -> Self {
        if e.is_timeout() {
            StageError::Timeout(e.to_string())
        } else {
            StageError::Capability(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_error_mapping() {
        let e: StageError = MediaError::FileNotFound(PathBuf::from("/in/talk.mp4")).into();
        assert_eq!(e.to_string(), "File not found: /in/talk.mp4");

        let e: StageError = MediaError::Timeout(30).into();
        assert!(matches!(e, StageError::Timeout(_)));

        let e: StageError = MediaError::metadata("No video stream found in file").into();
        assert!(e.to_string().starts_with("Metadata error: "));

        let e: StageError = MediaError::Validation(ValidationError::NoSegments).into();
        assert!(e.to_string().starts_with("Invalid data: "));

        let e: StageError = MediaError::model_not_found("/models/lq.rnnn").into();
        assert_eq!(e.kind(), "not_found");
        assert_eq!(e.to_string(), "File not found: model /models/lq.rnnn");
    }

    #[test]
    fn test_decision_prefixes() {
        assert!(StageError::capability("ffmpeg exited 1")
            .to_string()
            .starts_with("Processing error: "));
        assert!(StageError::NoSegments.to_string().starts_with("Invalid data: "));
    }
}
