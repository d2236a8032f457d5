//! The five pipeline stages.

mod clean;
mod cut;
mod denoise;
mod timeline;
mod transcribe;

pub use clean::{cleaning_prompt, CleanStage};
pub use cut::CutStage;
pub use denoise::DenoiseStage;
pub use timeline::TimelineStage;
pub use transcribe::TranscribeStage;

use std::path::Path;

use autocut_models::{TextRule, Transcript};

use crate::error::{StageError, StageResult};

fn require_input(path: &Path) -> StageResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(StageError::not_found(path.display().to_string()))
    }
}

/// Read and validate a transcript artifact written by an earlier stage.
async fn read_transcript(path: &Path, rule: TextRule) -> StageResult<Transcript> {
    require_input(path)?;
    let bytes = tokio::fs::read(path).await?;
    Ok(Transcript::from_json_slice(&bytes, rule)?)
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-process capability doubles for stage tests.

    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    use autocut_media::{
        plan_cuts, CutPlan, Denoiser, FrameRate, MediaCutter, MediaError, MediaProber,
        MediaResult, SpeechTranscriber, VideoInfo,
    };
    use autocut_models::{Segment, Transcript};

    use crate::error::{StageError, StageResult};
    use crate::ollama::TextCleaner;

    /// Copies bytes around instead of running ffmpeg.
    pub struct CopyDenoiser;

    #[async_trait]
    impl Denoiser for CopyDenoiser {
        async fn extract_audio(&self, video: &Path, wav: &Path) -> MediaResult<()> {
            if !video.exists() {
                return Err(MediaError::FileNotFound(video.to_path_buf()));
            }
            std::fs::write(wav, b"raw-pcm")?;
            Ok(())
        }

        async fn reduce_noise(&self, input: &Path, output: &Path, model: &Path) -> MediaResult<()> {
            if !model.exists() {
                return Err(MediaError::model_not_found(model.display().to_string()));
            }
            std::fs::copy(input, output)?;
            Ok(())
        }

        async fn remux(&self, _clean_wav: &Path, original_video: &Path, output: &Path) -> MediaResult<()> {
            std::fs::copy(original_video, output)?;
            Ok(())
        }
    }

    /// Returns a fixed transcript for any existing file.
    pub struct FixedTranscriber(pub Vec<Segment>);

    #[async_trait]
    impl SpeechTranscriber for FixedTranscriber {
        async fn transcribe(&self, wav: &Path) -> MediaResult<Transcript> {
            if !wav.exists() {
                return Err(MediaError::FileNotFound(wav.to_path_buf()));
            }
            let transcript = Transcript::new(self.0.clone());
            autocut_models::validate_transcript(&transcript, autocut_models::TextRule::NonEmpty)?;
            Ok(transcript)
        }
    }

    /// Upper-cases the segment text; fails on prompts containing `fail_on`.
    pub struct UppercaseCleaner {
        pub fail_on: Option<String>,
        pub reachable: bool,
        pub calls: AtomicU32,
    }

    impl UppercaseCleaner {
        pub fn new() -> Self {
            Self {
                fail_on: None,
                reachable: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TextCleaner for UppercaseCleaner {
        async fn clean(&self, prompt: &str) -> StageResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = &self.fail_on {
                if prompt.contains(marker.as_str()) {
                    return Err(StageError::capability("text generation failed after 3 attempts"));
                }
            }
            let text = prompt.lines().last().unwrap_or_default();
            Ok(format!(" {} ", text.to_uppercase()))
        }

        async fn is_reachable(&self) -> bool {
            self.reachable
        }

        fn endpoint(&self) -> String {
            "fake://cleaner".to_string()
        }
    }

    pub fn video_info(duration: f64) -> VideoInfo {
        VideoInfo {
            duration,
            width: 1280,
            height: 720,
            frame_rate: FrameRate::new(25, 1).unwrap(),
            codec: "h264".to_string(),
        }
    }

    pub struct FixedProber(pub VideoInfo);

    #[async_trait]
    impl MediaProber for FixedProber {
        async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
            Ok(self.0.clone())
        }
    }

    /// Plans cuts against a fixed duration and writes the kept ranges as text.
    pub struct ListingCutter {
        pub duration: f64,
    }

    #[async_trait]
    impl MediaCutter for ListingCutter {
        async fn cut(&self, source: &Path, segments: &[Segment], output: &Path) -> MediaResult<CutPlan> {
            if !source.exists() {
                return Err(MediaError::FileNotFound(source.to_path_buf()));
            }
            let plan = plan_cuts(segments, Some(self.duration));
            if plan.kept.is_empty() {
                return Err(MediaError::NoSegmentsInBounds);
            }
            let listing: String = plan
                .kept
                .iter()
                .map(|(_, s)| format!("{:.3}-{:.3}\n", s.start, s.end))
                .collect();
            std::fs::write(output, listing)?;
            Ok(plan)
        }
    }
}
