//! Edit-decision entries produced by timeline synthesis.

use serde::{Deserialize, Serialize};

/// One clip placement: where it lands on the output timeline and which span
/// of the single shared source asset it references.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDecision {
    /// Position on the output timeline in seconds
    pub offset: f64,
    /// Start inside the source asset in seconds
    pub source_start: f64,
    /// Clip length in seconds
    pub duration: f64,
}

impl EditDecision {
    /// Timeline position just after this clip.
    pub fn end_offset(&self) -> f64 {
        self.offset + self.duration
    }
}

/// Gap-free, ordered list of edit decisions over one source asset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditDecisionList {
    pub entries: Vec<EditDecision>,
}

impl EditDecisionList {
    pub fn new(entries: Vec<EditDecision>) -> Self {
        Self { entries }
    }

    /// Total output duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.entries.last().map(EditDecision::end_offset).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditDecision> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration_is_last_end() {
        let list = EditDecisionList::new(vec![
            EditDecision { offset: 0.0, source_start: 0.0, duration: 2.0 },
            EditDecision { offset: 2.0, source_start: 5.0, duration: 3.0 },
        ]);
        assert!((list.total_duration() - 5.0).abs() < 1e-9);
        assert!((EditDecisionList::default().total_duration()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_camel_case() {
        let entry = EditDecision { offset: 1.0, source_start: 4.0, duration: 0.5 };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["sourceStart"], 4.0);
    }
}
