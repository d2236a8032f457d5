//! Artifact naming for each pipeline stage.
//!
//! Every artifact is `<base id><suffix>` inside a fixed per-stage folder, so
//! a stage can derive its input and output paths from the base identifier
//! alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::base_id::BaseId;

/// Kinds of artifacts written by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Original input video, and the re-muxed denoised video
    Video,
    /// Audio track extracted from the video (temporary)
    RawAudio,
    /// Noise-reduced audio track
    CleanAudio,
    /// Transcriber output
    Transcript,
    /// Transcript after text cleaning
    CleanedTranscript,
    /// Video cut down to the retained segments
    CutVideo,
    /// Timeline document
    Timeline,
}

impl ArtifactKind {
    /// File name suffix appended to the base identifier.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Video => ".mp4",
            ArtifactKind::RawAudio => "_raw.wav",
            ArtifactKind::CleanAudio => "_clean.wav",
            ArtifactKind::Transcript => "_transcript.json",
            ArtifactKind::CleanedTranscript => "_llm_cleaned.json",
            ArtifactKind::CutVideo => "_video_clean.mp4",
            ArtifactKind::Timeline => "_timeline.xml",
        }
    }

    /// File name for a base identifier.
    pub fn file_name(&self, id: &BaseId) -> String {
        format!("{}{}", id.as_str(), self.suffix())
    }

    /// Full path of this artifact inside `dir`.
    pub fn path_in(&self, dir: impl AsRef<Path>, id: &BaseId) -> PathBuf {
        dir.as_ref().join(self.file_name(id))
    }
}

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Denoise,
    Transcribe,
    Clean,
    Cut,
    Timeline,
}

impl StageKind {
    /// All stages in pipeline order.
    pub const ALL: [StageKind; 5] = [
        StageKind::Denoise,
        StageKind::Transcribe,
        StageKind::Clean,
        StageKind::Cut,
        StageKind::Timeline,
    ];

    /// Stage name recorded in decision logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Denoise => "denoise",
            StageKind::Transcribe => "transcribe",
            StageKind::Clean => "llm_editing",
            StageKind::Cut => "video_segment_edit",
            StageKind::Timeline => "timeline_generation",
        }
    }

    /// Suffix of the per-item decision log file.
    pub fn log_suffix(&self) -> &'static str {
        match self {
            StageKind::Denoise => "_denoise.json",
            StageKind::Transcribe => "_transcribe.json",
            StageKind::Clean => "_llm_editing.json",
            StageKind::Cut => "_video_edit.json",
            StageKind::Timeline => "_timeline.json",
        }
    }

    /// 1-based position in the pipeline.
    pub fn step(&self) -> usize {
        match self {
            StageKind::Denoise => 1,
            StageKind::Transcribe => 2,
            StageKind::Clean => 3,
            StageKind::Cut => 4,
            StageKind::Timeline => 5,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
