#![deny(unreachable_patterns)]
//! External media capabilities for the autocut pipeline.
//!
//! This crate is the only place subprocesses are spawned. It provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - FFprobe metadata extraction with rational frame rates
//! - Denoising (audio extraction, RNNoise filtering, re-muxing)
//! - Speech transcription through the whisper.cpp CLI
//! - Lossless segment cutting and concatenation
//!
//! Each capability sits behind an `async_trait` seam so stages can be
//! exercised with in-process fakes.

pub mod command;
pub mod cut;
pub mod denoise;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod transcribe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cut::{plan_cuts, CutPlan, FfmpegCutter, MediaCutter};
pub use denoise::{AudioSettings, Denoiser, FfmpegDenoiser};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{write_atomic, TempArtifact};
pub use probe::{FfprobeProber, FrameRate, MediaProber, VideoInfo};
pub use transcribe::{SpeechTranscriber, WhisperCliTranscriber};
