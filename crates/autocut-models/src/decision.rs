//! Decision log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::StageKind;

/// Decision text recorded for a successful item.
pub const SUCCESS_DECISION: &str = "success";

/// Outcome of one stage for one base identifier.
///
/// Written once at the end of a stage's processing of an item and
/// overwritten on reruns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    /// Original video file name (`<base id>.mp4`)
    pub file: String,
    /// Stage name
    pub stage: String,
    /// `"success"` or a human-readable error description
    pub decision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DecisionLogEntry {
    pub fn success(file: impl Into<String>, stage: StageKind) -> Self {
        Self::new(file, stage, SUCCESS_DECISION)
    }

    pub fn failure(file: impl Into<String>, stage: StageKind, reason: impl Into<String>) -> Self {
        Self::new(file, stage, reason)
    }

    fn new(file: impl Into<String>, stage: StageKind, decision: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            stage: stage.as_str().to_string(),
            decision: decision.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.decision == SUCCESS_DECISION
    }
}
