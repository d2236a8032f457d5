//! Pipeline orchestration.
//!
//! Runs the five stages in order for each input video. A video's run stops
//! at its first failed stage; other videos are still attempted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};

use autocut_media::{
    Denoiser, FfmpegCutter, FfmpegDenoiser, FfmpegRunner, FfprobeProber, MediaCutter,
    MediaProber, SpeechTranscriber, WhisperCliTranscriber,
};
use autocut_models::{ArtifactKind, BaseId, DecisionLogEntry, StageKind};

use crate::config::{OutputDirs, PipelineConfig};
use crate::decision_log::DecisionLog;
use crate::error::{StageError, StageResult};
use crate::ollama::{OllamaClient, TextCleaner};
use crate::stage::{ItemOutcome, Stage};
use crate::stages::{CleanStage, CutStage, DenoiseStage, TimelineStage, TranscribeStage};

/// External capabilities the stages are built on.
#[derive(Clone)]
pub struct Capabilities {
    pub denoiser: Arc<dyn Denoiser>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub cleaner: Arc<dyn TextCleaner>,
    pub cutter: Arc<dyn MediaCutter>,
    pub prober: Arc<dyn MediaProber>,
}

impl Capabilities {
    /// ffmpeg/ffprobe/whisper.cpp CLIs and the Ollama HTTP API.
    pub fn from_config(config: &PipelineConfig) -> StageResult<Self> {
        let timeout = config.media_timeout.as_secs();
        let runner = FfmpegRunner::new().with_timeout(timeout);
        let prober: Arc<dyn MediaProber> = Arc::new(FfprobeProber::new().with_timeout(timeout));
        let cleaner = OllamaClient::new(&config.ollama)?;

        Ok(Self {
            denoiser: Arc::new(FfmpegDenoiser::new(runner.clone(), config.audio.clone())),
            transcriber: Arc::new(
                WhisperCliTranscriber::new(&config.whisper_bin, &config.whisper_model)
                    .with_timeout(timeout),
            ),
            cleaner: Arc::new(cleaner),
            cutter: Arc::new(FfmpegCutter::new(
                runner,
                Box::new(FfprobeProber::new().with_timeout(timeout)),
            )),
            prober,
        })
    }
}

/// Outcome of the whole pipeline for one video.
#[derive(Debug)]
pub struct VideoReport {
    pub id: BaseId,
    pub source: PathBuf,
    /// One entry per stage that ran, in order
    pub outcomes: Vec<ItemOutcome>,
}

impl VideoReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.len() == StageKind::ALL.len() && self.outcomes.iter().all(ItemOutcome::is_success)
    }

    /// The stage that stopped this video, if any.
    pub fn failed_stage(&self) -> Option<(StageKind, &StageError)> {
        self.outcomes
            .iter()
            .find_map(|o| o.error.as_ref().map(|e| (o.stage, e)))
    }
}

/// A discovered video that never reached the stages.
#[derive(Debug)]
pub struct RejectedVideo {
    pub source: PathBuf,
    pub error: StageError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub videos: Vec<VideoReport>,
    pub rejected: Vec<RejectedVideo>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.videos.iter().filter(|v| v.is_success()).count()
    }

    /// Videos that failed a stage plus rejected inputs.
    pub fn failed(&self) -> usize {
        self.videos.len() - self.succeeded() + self.rejected.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Resolve the CLI input into the videos to process.
///
/// A file must be an `.mp4`; a directory yields its `*.mp4` files in
/// lexical order and must contain at least one.
pub async fn discover_videos(input: &Path) -> StageResult<Vec<PathBuf>> {
    let metadata = match tokio::fs::metadata(input).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StageError::not_found(input.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.is_file() {
        if !is_mp4(input) {
            return Err(StageError::precondition(format!(
                "input file must be an MP4 file: {}",
                input.display()
            )));
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut videos = Vec::new();
    let mut entries = tokio::fs::read_dir(input).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_mp4(&path) {
            videos.push(path);
        }
    }
    if videos.is_empty() {
        return Err(StageError::not_found(format!(
            "no MP4 files in input directory {}",
            input.display()
        )));
    }
    videos.sort();
    Ok(videos)
}

fn is_mp4(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(ArtifactKind::Video.suffix()))
}

/// Sequences the stages over one or many videos.
pub struct Orchestrator {
    dirs: OutputDirs,
    denoise_model: PathBuf,
    decisions: DecisionLog,
    capabilities: Capabilities,
    transcribe: TranscribeStage,
    clean: CleanStage,
    cut: CutStage,
    timeline: TimelineStage,
}

impl Orchestrator {
    pub fn new(
        output_dir: impl AsRef<Path>,
        log_dir: impl Into<PathBuf>,
        denoise_model: impl Into<PathBuf>,
        capabilities: Capabilities,
    ) -> Self {
        let dirs = OutputDirs::new(output_dir);
        let decisions = DecisionLog::new(log_dir);

        let transcribe = TranscribeStage::new(
            &dirs.denoised,
            &dirs.transcripts,
            capabilities.transcriber.clone(),
            decisions.clone(),
        );
        let clean = CleanStage::new(
            &dirs.transcripts,
            &dirs.edited,
            capabilities.cleaner.clone(),
            decisions.clone(),
        );
        let cut = CutStage::new(
            &dirs.edited,
            &dirs.denoised,
            &dirs.edited_segments,
            capabilities.cutter.clone(),
            decisions.clone(),
        );
        let timeline = TimelineStage::new(
            &dirs.edited,
            &dirs.denoised,
            &dirs.timelines,
            capabilities.prober.clone(),
            decisions.clone(),
        );

        Self {
            dirs,
            denoise_model: denoise_model.into(),
            decisions,
            capabilities,
            transcribe,
            clean,
            cut,
            timeline,
        }
    }

    pub fn from_config(config: &PipelineConfig, capabilities: Capabilities) -> Self {
        Self::new(
            &config.output_dir,
            &config.log_dir,
            &config.denoise_model,
            capabilities,
        )
    }

    pub fn dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    /// Create the output and log folders.
    ///
    /// With `reset`, files left by earlier runs are removed first; the
    /// folders themselves are kept.
    pub async fn prepare(&self, reset: bool) -> StageResult<()> {
        if reset {
            clear_dir(self.decisions.dir()).await?;
            for dir in self.dirs.all() {
                clear_dir(dir).await?;
            }
        }
        self.dirs.create_all().await?;
        tokio::fs::create_dir_all(self.decisions.dir()).await?;
        Ok(())
    }

    /// Run all stages for one video.
    pub async fn run_video(&self, video: &Path) -> StageResult<VideoReport> {
        let id = BaseId::from_path(video)
            .map_err(|e| StageError::precondition(format!("{}: {}", video.display(), e)))?;
        let source_dir = video
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let span = tracing::info_span!("video", base_id = %id);
        let report = self.run_stages(&id, video, source_dir).instrument(span).await;
        Ok(report)
    }

    async fn run_stages(&self, id: &BaseId, video: &Path, source_dir: &Path) -> VideoReport {
        let started = Instant::now();
        info!("Starting pipeline for {}", video.display());

        let denoise = DenoiseStage::new(
            source_dir,
            &self.dirs.denoised,
            &self.denoise_model,
            self.capabilities.denoiser.clone(),
            self.decisions.clone(),
        );

        let mut report = VideoReport {
            id: id.clone(),
            source: video.to_path_buf(),
            outcomes: Vec::with_capacity(StageKind::ALL.len()),
        };

        let stages: [&dyn Stage; 5] = [&denoise, &self.transcribe, &self.clean, &self.cut, &self.timeline];
        for stage in stages {
            info!("Step {}: {}", stage.kind().step(), stage.kind());

            let outcome = if stage.kind() == StageKind::Clean && !self.capabilities.cleaner.is_reachable().await {
                let err = StageError::precondition(format!(
                    "text generation service is not running at {}",
                    self.capabilities.cleaner.endpoint()
                ));
                stage.finish(id, Err(err)).await
            } else {
                stage.process_one(id).await
            };

            let failed = !outcome.is_success();
            report.outcomes.push(outcome);
            if failed {
                break;
            }
        }

        match report.failed_stage() {
            None => info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline completed successfully for {}",
                video.display()
            ),
            Some((stage, e)) => error!(
                failed_stage = %stage,
                error_kind = e.kind(),
                "Pipeline failed for {}: {}",
                video.display(),
                e
            ),
        }
        report
    }

    /// Run every video in order; one video's failure does not stop the rest.
    pub async fn run_all(&self, videos: &[PathBuf]) -> BatchReport {
        let mut batch = BatchReport::default();
        for video in videos {
            match self.run_video(video).await {
                Ok(report) => batch.videos.push(report),
                Err(e) => {
                    error!(error_kind = e.kind(), "Rejected {}: {}", video.display(), e);
                    self.record_rejection(video, &e).await;
                    batch.rejected.push(RejectedVideo {
                        source: video.clone(),
                        error: e,
                    });
                }
            }
        }
        info!(
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "Batch finished"
        );
        batch
    }

    /// Log a rejected input against the first stage, keyed by file name.
    async fn record_rejection(&self, video: &Path, err: &StageError) {
        let file = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| video.display().to_string());
        let entry = DecisionLogEntry::failure(&file, StageKind::Denoise, err.to_string());
        if let Err(e) = self
            .decisions
            .record_rejected(&file, StageKind::Denoise, &entry)
            .await
        {
            error!("Failed to write decision log for {}: {}", video.display(), e);
        }
    }
}

/// Remove the files inside `dir`, keeping the directory tree.
async fn clear_dir(dir: &Path) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
            tokio::fs::create_dir(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}
