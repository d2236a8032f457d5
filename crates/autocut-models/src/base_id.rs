//! Base identifier shared by all artifacts of one video.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised when deriving a base identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseIdError {
    #[error("path has no file stem: {0}")]
    NoStem(String),

    #[error("base identifier is empty")]
    Empty,

    #[error("base identifier contains a path separator: {0}")]
    Separator(String),
}

/// Filename stem that correlates one video's artifacts across stage folders.
///
/// Derived once from the original file name and never regenerated while a
/// pipeline run is in flight.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseId(String);

impl BaseId {
    /// Create from an existing stem.
    pub fn new(stem: impl Into<String>) -> Result<Self, BaseIdError> {
        let stem = stem.into();
        if stem.trim().is_empty() {
            return Err(BaseIdError::Empty);
        }
        if stem.contains('/') || stem.contains('\\') {
            return Err(BaseIdError::Separator(stem));
        }
        Ok(Self(stem))
    }

    /// Derive from a file path (`talk.mp4` -> `talk`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BaseIdError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BaseIdError::NoStem(path.display().to_string()))?;
        Self::new(stem)
    }

    /// Derive from a file name carrying a known suffix
    /// (`talk_clean.wav` with suffix `_clean.wav` -> `talk`).
    pub fn from_suffixed(file_name: &str, suffix: &str) -> Option<Self> {
        file_name
            .strip_suffix(suffix)
            .and_then(|stem| Self::new(stem).ok())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
