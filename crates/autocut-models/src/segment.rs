//! Transcript segment.

use serde::{Deserialize, Serialize};

/// One retained (or transcribed) span of source media, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (strictly greater than `start`)
    pub end: f64,
    /// Spoken text
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the segment lies entirely inside `[0, source_duration]`.
    pub fn fits_within(&self, source_duration: f64) -> bool {
        self.start >= 0.0 && self.start < source_duration && self.end <= source_duration
    }

    /// Copy of this segment carrying different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            start: self.start,
            end: self.end,
            text: text.into(),
        }
    }
}
