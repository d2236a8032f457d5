//! Stage runner contract.
//!
//! A stage implements [`Stage::execute`] for one base identifier and gets
//! input discovery, decision logging and per-item failure isolation from
//! the provided methods.

use async_trait::async_trait;
use std::path::Path;
use tracing::{error, warn, Instrument};

use autocut_models::{ArtifactKind, BaseId, DecisionLogEntry, StageKind};

use crate::decision_log::DecisionLog;
use crate::error::{StageError, StageResult};
use crate::logging::StageLogger;

/// Result of one stage for one item.
#[derive(Debug)]
pub struct ItemOutcome {
    pub id: BaseId,
    pub stage: StageKind,
    pub error: Option<StageError>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated outcomes of [`Stage::run_all`].
#[derive(Debug)]
pub struct StageReport {
    pub stage: StageKind,
    pub outcomes: Vec<ItemOutcome>,
}

impl StageReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// One pipeline phase bound to one capability and one artifact contract.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn logger(&self) -> &StageLogger;

    fn decisions(&self) -> &DecisionLog;

    /// Folder scanned by [`Stage::discover_inputs`].
    fn input_dir(&self) -> &Path;

    /// Suffix that marks an eligible input file.
    fn input_suffix(&self) -> &'static str;

    /// Do the work for one item. Must not write the decision log.
    async fn execute(&self, id: &BaseId) -> StageResult<()>;

    /// Base identifiers with an eligible input, sorted lexically.
    ///
    /// A missing input folder yields no work.
    async fn discover_inputs(&self) -> StageResult<Vec<BaseId>> {
        let dir = self.input_dir();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(stage = %self.kind(), "Input folder {} does not exist", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name
                .to_str()
                .and_then(|n| BaseId::from_suffixed(n, self.input_suffix()))
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Run [`Stage::execute`] and record exactly one decision for the item.
    ///
    /// Never fails: errors end up in the returned outcome and in the
    /// decision log.
    async fn process_one(&self, id: &BaseId) -> ItemOutcome {
        let span = self.logger().item_span(id);
        async {
            self.logger().log_start(id);
            let result = self.execute(id).await;
            self.finish(id, result).await
        }
        .instrument(span)
        .await
    }

    /// Record the decision for `id` and turn `result` into an outcome.
    async fn finish(&self, id: &BaseId, result: StageResult<()>) -> ItemOutcome {
        let file = ArtifactKind::Video.file_name(id);
        let entry = match &result {
            Ok(()) => {
                self.logger().log_completion(id);
                DecisionLogEntry::success(file, self.kind())
            }
            Err(e) => {
                let reason = e.to_string();
                self.logger().log_failure(id, e.kind(), &reason);
                DecisionLogEntry::failure(file, self.kind(), reason)
            }
        };

        if let Err(e) = self.decisions().record(id, self.kind(), &entry).await {
            error!(stage = %self.kind(), base_id = %id, "Failed to write decision log: {}", e);
        }

        ItemOutcome {
            id: id.clone(),
            stage: self.kind(),
            error: result.err(),
        }
    }

    /// Process every discovered item in order. Zero inputs is a no-op.
    async fn run_all(&self) -> StageResult<StageReport> {
        let ids = self.discover_inputs().await?;
        if ids.is_empty() {
            warn!(stage = %self.kind(), "No inputs found to process");
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in &ids {
            outcomes.push(self.process_one(id).await);
        }

        Ok(StageReport {
            stage: self.kind(),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Succeeds when `<id>.txt` exists in its input folder.
    struct ProbeStage {
        input: PathBuf,
        logger: StageLogger,
        decisions: DecisionLog,
    }

    #[async_trait]
    impl Stage for ProbeStage {
        fn kind(&self) -> StageKind {
            StageKind::Transcribe
        }

        fn logger(&self) -> &StageLogger {
            &self.logger
        }

        fn decisions(&self) -> &DecisionLog {
            &self.decisions
        }

        fn input_dir(&self) -> &Path {
            &self.input
        }

        fn input_suffix(&self) -> &'static str {
            ".txt"
        }

        async fn execute(&self, id: &BaseId) -> StageResult<()> {
            let path = self.input.join(format!("{}.txt", id));
            if path.exists() {
                Ok(())
            } else {
                Err(StageError::not_found(path.display().to_string()))
            }
        }
    }

    fn stage(dir: &TempDir) -> ProbeStage {
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        ProbeStage {
            input,
            logger: StageLogger::new(StageKind::Transcribe),
            decisions: DecisionLog::new(dir.path().join("logs")),
        }
    }

    #[tokio::test]
    async fn test_discovery_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let stage = stage(&dir);
        for name in ["c.txt", "a.txt", "b.txt", "notes.md"] {
            std::fs::write(stage.input.join(name), "").unwrap();
        }
        std::fs::create_dir(stage.input.join("d.txt")).unwrap();

        let ids = stage.discover_inputs().await.unwrap();
        let names: Vec<_> = ids.iter().map(BaseId::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_input_folder_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mut stage = stage(&dir);
        stage.input = dir.path().join("absent");

        let report = stage.run_all().await.unwrap();
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let stage = stage(&dir);
        std::fs::write(stage.input.join("one.txt"), "").unwrap();
        std::fs::write(stage.input.join("three.txt"), "").unwrap();

        let ids: Vec<_> = ["one", "two", "three"]
            .iter()
            .map(|s| BaseId::new(*s).unwrap())
            .collect();
        let mut outcomes = Vec::new();
        for id in &ids {
            outcomes.push(stage.process_one(id).await);
        }

        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1].error, Some(StageError::NotFound(_))));
        assert!(outcomes[2].is_success());

        let decisions: Vec<_> = {
            let mut v = Vec::new();
            for id in &ids {
                v.push(stage.decisions.read(id, StageKind::Transcribe).await.unwrap().unwrap());
            }
            v
        };
        assert!(decisions[0].is_success());
        assert!(decisions[1].decision.starts_with("File not found: "));
        assert!(decisions[2].is_success());
    }

    #[tokio::test]
    async fn test_run_all_aggregates() {
        let dir = TempDir::new().unwrap();
        let stage = stage(&dir);
        std::fs::write(stage.input.join("a.txt"), "").unwrap();
        std::fs::write(stage.input.join("b.txt"), "").unwrap();

        let report = stage.run_all().await.unwrap();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 0);
    }
}
