//! Shared data models for the autocut pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Transcript segments and the transcript schema validator
//! - Base identifiers and per-stage artifact naming
//! - Decision log entries
//! - Edit-decision entries produced by timeline synthesis

pub mod artifact;
pub mod base_id;
pub mod decision;
pub mod edit_decision;
pub mod segment;
pub mod transcript;
pub mod validation;

// Re-export common types
pub use artifact::{ArtifactKind, StageKind};
pub use base_id::{BaseId, BaseIdError};
pub use decision::{DecisionLogEntry, SUCCESS_DECISION};
pub use edit_decision::{EditDecision, EditDecisionList};
pub use segment::Segment;
pub use transcript::Transcript;
pub use validation::{validate, validate_transcript, TextRule, ValidationError};
