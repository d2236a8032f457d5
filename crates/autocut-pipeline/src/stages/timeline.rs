//! Stage 5: timeline document generation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_media::{write_atomic, MediaProber};
use autocut_models::{ArtifactKind, BaseId, StageKind, TextRule};

use crate::decision_log::DecisionLog;
use crate::error::StageResult;
use crate::logging::StageLogger;
use crate::stage::Stage;
use crate::stages::{read_transcript, require_input};
use crate::timeline::synthesize;

/// `edited/<id>_llm_cleaned.json` + `denoised/<id>.mp4`
/// -> `timelines/<id>_timeline.xml`
///
/// Clip times are source times, so the asset is the full-length denoised
/// video rather than the cut one.
pub struct TimelineStage {
    transcript_dir: PathBuf,
    video_dir: PathBuf,
    output_dir: PathBuf,
    prober: Arc<dyn MediaProber>,
    logger: StageLogger,
    decisions: DecisionLog,
}

impl TimelineStage {
    pub fn new(
        transcript_dir: impl Into<PathBuf>,
        video_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        prober: Arc<dyn MediaProber>,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            transcript_dir: transcript_dir.into(),
            video_dir: video_dir.into(),
            output_dir: output_dir.into(),
            prober,
            logger: StageLogger::new(StageKind::Timeline),
            decisions,
        }
    }
}

#[async_trait]
impl Stage for TimelineStage {
    fn kind(&self) -> StageKind {
        StageKind::Timeline
    }

    fn logger(&self) -> &StageLogger {
        &self.logger
    }

    fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    fn input_dir(&self) -> &Path {
        &self.transcript_dir
    }

    fn input_suffix(&self) -> &'static str {
        ArtifactKind::CleanedTranscript.suffix()
    }

    async fn execute(&self, id: &BaseId) -> StageResult<()> {
        let transcript_path = ArtifactKind::CleanedTranscript.path_in(&self.transcript_dir, id);
        let video = ArtifactKind::Video.path_in(&self.video_dir, id);
        let transcript = read_transcript(&transcript_path, TextRule::Any).await?;
        require_input(&video)?;

        let info = self.prober.probe(&video).await?;
        let timeline = synthesize(&transcript.segments, &info)?;

        let src = tokio::fs::canonicalize(&video).await?;
        let output = ArtifactKind::Timeline.path_in(&self.output_dir, id);
        write_atomic(&output, timeline.to_fcpxml(&src)?).await?;

        self.logger.log_progress(
            id,
            &format!(
                "Timeline with {} clips, {:.3}s, written to {}",
                timeline.edits.len(),
                timeline.total_duration(),
                output.display()
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::stages::fakes::{video_info, FixedProber};
    use async_trait::async_trait;
    use autocut_media::{MediaError, MediaResult, VideoInfo};
    use autocut_models::{Segment, Transcript};
    use tempfile::TempDir;

    struct BrokenProber;

    #[async_trait]
    impl MediaProber for BrokenProber {
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            Err(MediaError::metadata("No video stream found in file"))
        }
    }

    fn setup(dir: &TempDir, prober: Arc<dyn MediaProber>) -> TimelineStage {
        let edited = dir.path().join("edited");
        let denoised = dir.path().join("denoised");
        std::fs::create_dir_all(&edited).unwrap();
        std::fs::create_dir_all(&denoised).unwrap();
        let segments = vec![
            Segment::new(0.0, 2.0, "a"),
            Segment::new(5.0, 8.0, "b"),
            Segment::new(10.0, 10.5, "c"),
        ];
        std::fs::write(
            edited.join("talk_llm_cleaned.json"),
            Transcript::new(segments).to_json_pretty().unwrap(),
        )
        .unwrap();
        std::fs::write(denoised.join("talk.mp4"), b"video").unwrap();
        TimelineStage::new(
            edited,
            denoised,
            dir.path().join("timelines"),
            prober,
            DecisionLog::new(dir.path().join("logs")),
        )
    }

    #[tokio::test]
    async fn test_timeline_written() {
        let dir = TempDir::new().unwrap();
        let stage = setup(&dir, Arc::new(FixedProber(video_info(60.0))));
        let id = BaseId::new("talk").unwrap();

        let outcome = stage.process_one(&id).await;
        assert!(outcome.is_success(), "{:?}", outcome.error);

        let xml = std::fs::read_to_string(dir.path().join("timelines/talk_timeline.xml")).unwrap();
        assert!(xml.contains(r#"frameDuration="1/25s""#));
        assert!(xml.contains(r#"offset="5.000s" start="10.000s" duration="0.500s""#));
        assert!(xml.contains(r#"duration="5.500s""#));
        assert!(xml.contains("denoised/talk.mp4"));

        let entry = stage.decisions.read(&id, StageKind::Timeline).await.unwrap().unwrap();
        assert_eq!(entry.stage, "timeline_generation");
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let stage = setup(&dir, Arc::new(FixedProber(video_info(60.0))));
        let id = BaseId::new("talk").unwrap();
        let output = dir.path().join("timelines/talk_timeline.xml");

        assert!(stage.process_one(&id).await.is_success());
        let first = std::fs::read(&output).unwrap();
        assert!(stage.process_one(&id).await.is_success());
        assert_eq!(std::fs::read(&output).unwrap(), first);
    }

    #[tokio::test]
    async fn test_metadata_failure() {
        let dir = TempDir::new().unwrap();
        let stage = setup(&dir, Arc::new(BrokenProber));
        let id = BaseId::new("talk").unwrap();

        let outcome = stage.process_one(&id).await;
        assert!(matches!(outcome.error, Some(StageError::Metadata(_))));
        let entry = stage.decisions.read(&id, StageKind::Timeline).await.unwrap().unwrap();
        assert!(entry.decision.starts_with("Metadata error: "));
    }
}
