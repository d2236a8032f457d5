//! Staged video clean-up pipeline.
//!
//! Each source video runs through five stages that communicate only through
//! artifact files keyed by the video's base identifier:
//!
//! 1. denoise: RNNoise over the audio track, re-muxed under the original video
//! 2. transcribe: whisper.cpp over the clean audio
//! 3. clean: per-segment text clean-up through Ollama
//! 4. cut: lossless cut of the denoised video to the retained segments
//! 5. timeline: FCPXML timeline over the denoised video
//!
//! Every stage writes one decision log entry per item and isolates item
//! failures from their siblings.

pub mod config;
pub mod decision_log;
pub mod error;
pub mod logging;
pub mod ollama;
pub mod orchestrator;
pub mod retry;
pub mod stage;
pub mod stages;
pub mod timeline;

pub use config::{OllamaConfig, OutputDirs, PipelineConfig};
pub use decision_log::DecisionLog;
pub use error::{StageError, StageResult};
pub use logging::StageLogger;
pub use ollama::{OllamaClient, OllamaError, TextCleaner};
pub use orchestrator::{
    discover_videos, BatchReport, Capabilities, Orchestrator, RejectedVideo, VideoReport,
};
pub use retry::{retry_async_when, RetryConfig, RetryResult};
pub use stage::{ItemOutcome, Stage, StageReport};
pub use timeline::{synthesize, Timeline};
