//! Lossless cutting of a source video down to retained segments.
//!
//! # Strategy
//!
//! Each segment is extracted to its own temporary clip with stream copy
//! (`-c:v copy -c:a copy`), then the clips are joined with the concat
//! demuxer, again without re-encoding. The clips and the concat list live
//! in a temporary directory removed on every exit path.
//!
//! Stream copy snaps to keyframes, so clip boundaries can drift slightly
//! from the requested times.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use autocut_models::Segment;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{FfprobeProber, MediaProber};

/// Which segments will be cut and which are out of bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CutPlan {
    /// `(original index, segment)` in input order
    pub kept: Vec<(usize, Segment)>,
    /// Original indexes of segments outside the source duration
    pub skipped: Vec<usize>,
}

/// Split segments into in-bounds and out-of-bounds sets.
///
/// A segment is skipped when any part of it lies outside
/// `[0, source_duration]`. With an unknown duration every segment is kept.
/// Order is preserved; overlapping segments are not merged.
pub fn plan_cuts(segments: &[Segment], source_duration: Option<f64>) -> CutPlan {
    let mut plan = CutPlan::default();
    for (index, seg) in segments.iter().enumerate() {
        match source_duration {
            Some(duration) if !seg.fits_within(duration) => plan.skipped.push(index),
            _ => plan.kept.push((index, seg.clone())),
        }
    }
    plan
}

/// Media-cutting capability.
#[async_trait]
pub trait MediaCutter: Send + Sync {
    /// Cut `source` to `segments` and write the concatenation to `output`.
    ///
    /// Returns the plan that was applied.
    async fn cut(&self, source: &Path, segments: &[Segment], output: &Path) -> MediaResult<CutPlan>;
}

/// [`MediaCutter`] backed by the `ffmpeg` CLI.
pub struct FfmpegCutter {
    runner: FfmpegRunner,
    prober: Box<dyn MediaProber>,
}

impl Default for FfmpegCutter {
    fn default() -> Self {
        Self::new(FfmpegRunner::new(), Box::new(FfprobeProber::new()))
    }
}

impl FfmpegCutter {
    pub fn new(runner: FfmpegRunner, prober: Box<dyn MediaProber>) -> Self {
        Self { runner, prober }
    }
}

/// Stream-copy extraction of one segment.
pub fn extract_clip_command(source: &Path, clip: &Path, segment: &Segment) -> FfmpegCommand {
    FfmpegCommand::new(source, clip)
        .trim(segment.start, segment.duration())
        .video_codec("copy")
        .audio_codec("copy")
}

/// Concat-demuxer join of the clips listed in `list`.
pub fn concat_command(list: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(list, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy()
}

/// Contents of a concat demuxer list file.
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

#[async_trait]
impl MediaCutter for FfmpegCutter {
    async fn cut(&self, source: &Path, segments: &[Segment], output: &Path) -> MediaResult<CutPlan> {
        if !source.exists() {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        let info = self.prober.probe(source).await?;
        let duration = (info.duration > 0.0).then_some(info.duration);
        if duration.is_none() {
            warn!("Source duration unknown for {}, no bounds check", source.display());
        }

        let plan = plan_cuts(segments, duration);
        for index in &plan.skipped {
            let seg = &segments[*index];
            warn!(
                segment = index,
                start = seg.start,
                end = seg.end,
                source_duration = info.duration,
                "Segment out of bounds, skipping"
            );
        }
        if plan.kept.is_empty() {
            return Err(MediaError::NoSegmentsInBounds);
        }

        let temp_dir = tempfile::tempdir()?;
        let mut clips = Vec::with_capacity(plan.kept.len());

        for (i, (index, seg)) in plan.kept.iter().enumerate() {
            let clip = temp_dir.path().join(format!("seg_{:04}.mp4", i));
            debug!(
                segment = index,
                start = seg.start,
                duration = seg.duration(),
                "Extracting segment"
            );
            self.runner.run(&extract_clip_command(source, &clip, seg)).await?;
            clips.push(clip);
        }

        let list = temp_dir.path().join("concat.txt");
        tokio::fs::write(&list, concat_list(&clips)).await?;
        self.runner.run(&concat_command(&list, output)).await?;

        info!(
            kept = plan.kept.len(),
            skipped = plan.skipped.len(),
            "Exported cut video {}",
            output.display()
        );

        // temp_dir is removed when dropped
        Ok(plan)
    }
}
