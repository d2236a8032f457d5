//! Transcript document.

use serde::{Deserialize, Serialize};

use crate::segment::Segment;
use crate::validation::{validate, TextRule, ValidationError};

/// Ordered sequence of segments for one base identifier.
///
/// Segments are expected in non-decreasing start order but this is not
/// enforced; consumers process them in the order given.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse and validate JSON text.
    pub fn from_json_str(json: &str, rule: TextRule) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        validate(&value, rule)
    }

    /// Parse and validate JSON bytes.
    pub fn from_json_slice(json: &[u8], rule: TextRule) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_slice(json)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        validate(&value, rule)
    }

    /// Pretty-printed JSON. Output is deterministic for identical transcripts.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of all segment durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }
}
