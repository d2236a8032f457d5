//! Transcript schema validation.
//!
//! Every stage re-validates the transcript it reads instead of trusting the
//! stage that wrote it. Validation works on an untyped JSON value so that a
//! malformed artifact always produces a definitive pass/fail with a reason,
//! never a panic. Checks run in a fixed order and stop at the first failure:
//!
//! 1. top-level value is an object with a `segments` field
//! 2. `segments` is an array
//! 3. the array is non-empty
//! 4. every element has `start`, `end` and `text`
//! 5. `start` and `end` are numbers
//! 6. `start >= 0` and `end > start`
//! 7. `text` is a string, non-blank under [`TextRule::NonEmpty`]

use serde_json::Value;
use thiserror::Error;

use crate::segment::Segment;
use crate::transcript::Transcript;

const REQUIRED_FIELDS: [&str; 3] = ["start", "end", "text"];

/// How strictly segment text is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRule {
    /// Any string is accepted
    #[default]
    Any,
    /// Text must be non-empty after trimming (transcriber output)
    NonEmpty,
}

/// Reason a transcript failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("transcript is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("transcript is not an object")]
    NotARecord,

    #[error("transcript missing 'segments' key")]
    MissingSegments,

    #[error("transcript segments is not a list")]
    SegmentsNotSequence,

    #[error("transcript segments list is empty")]
    NoSegments,

    #[error("segment {index} is not an object")]
    SegmentNotRecord { index: usize },

    #[error("segment {index} missing required key '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("segment {index} has invalid start/end types")]
    NonNumericTime { index: usize },

    #[error("segment {index} has invalid time range ({start} -> {end})")]
    InvalidTimeRange { index: usize, start: f64, end: f64 },

    #[error("segment {index} has non-string text")]
    NonStringText { index: usize },

    #[error("segment {index} has empty text")]
    EmptyText { index: usize },
}

/// Validate an untyped transcript and convert it into a [`Transcript`].
pub fn validate(value: &Value, rule: TextRule) -> Result<Transcript, ValidationError> {
    let record = value.as_object().ok_or(ValidationError::NotARecord)?;
    let segments = record
        .get("segments")
        .ok_or(ValidationError::MissingSegments)?
        .as_array()
        .ok_or(ValidationError::SegmentsNotSequence)?;

    if segments.is_empty() {
        return Err(ValidationError::NoSegments);
    }

    segments
        .iter()
        .enumerate()
        .map(|(index, raw)| validate_segment(index, raw, rule))
        .collect::<Result<Vec<_>, _>>()
        .map(Transcript::new)
}

/// Re-check a typed transcript against the same rules.
///
/// Used on data produced in-process (transcriber output, cleaned text)
/// before it is persisted.
pub fn validate_transcript(transcript: &Transcript, rule: TextRule) -> Result<(), ValidationError> {
    if transcript.segments.is_empty() {
        return Err(ValidationError::NoSegments);
    }
    for (index, seg) in transcript.segments.iter().enumerate() {
        check_range(index, seg.start, seg.end)?;
        check_text(index, &seg.text, rule)?;
    }
    Ok(())
}

fn validate_segment(index: usize, raw: &Value, rule: TextRule) -> Result<Segment, ValidationError> {
    let fields = raw
        .as_object()
        .ok_or(ValidationError::SegmentNotRecord { index })?;

    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err(ValidationError::MissingField { index, field: *field });
    }

    let (start, end) = match (fields["start"].as_f64(), fields["end"].as_f64()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::NonNumericTime { index }),
    };
    check_range(index, start, end)?;

    let text = fields["text"]
        .as_str()
        .ok_or(ValidationError::NonStringText { index })?;
    check_text(index, text, rule)?;

    Ok(Segment::new(start, end, text))
}

fn check_range(index: usize, start: f64, end: f64) -> Result<(), ValidationError> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
        return Err(ValidationError::InvalidTimeRange { index, start, end });
    }
    Ok(())
}

fn check_text(index: usize, text: &str, rule: TextRule) -> Result<(), ValidationError> {
    if rule == TextRule::NonEmpty && text.trim().is_empty() {
        return Err(ValidationError::EmptyText { index });
    }
    Ok(())
}
