//! Per-item decision log files.
//!
//! One pretty-printed JSON document per (base id, stage), replaced on every
//! rerun.

use std::path::{Path, PathBuf};
use tracing::debug;

use autocut_media::write_atomic;
use autocut_models::{BaseId, DecisionLogEntry, StageKind};

use crate::error::{StageError, StageResult};

#[derive(Debug, Clone)]
pub struct DecisionLog {
    dir: PathBuf,
}

impl DecisionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<id><stage log suffix>`
    pub fn path_for(&self, id: &BaseId, stage: StageKind) -> PathBuf {
        self.path_for_key(id.as_str(), stage)
    }

    fn path_for_key(&self, key: &str, stage: StageKind) -> PathBuf {
        self.dir.join(format!("{}{}", key, stage.log_suffix()))
    }

    /// Write `entry`, replacing any previous entry for the same item and stage.
    pub async fn record(&self, id: &BaseId, stage: StageKind, entry: &DecisionLogEntry) -> StageResult<PathBuf> {
        self.write(self.path_for(id, stage), entry).await
    }

    /// Write `entry` for an input whose base identifier could not be derived,
    /// keyed by its file name instead.
    pub async fn record_rejected(&self, file_name: &str, stage: StageKind, entry: &DecisionLogEntry) -> StageResult<PathBuf> {
        self.write(self.path_for_key(file_name, stage), entry).await
    }

    async fn write(&self, path: PathBuf, entry: &DecisionLogEntry) -> StageResult<PathBuf> {
        let json = serde_json::to_vec_pretty(entry)?;
        write_atomic(&path, json).await.map_err(StageError::from)?;
        debug!(decision = %entry.decision, "Wrote decision log {}", path.display());
        Ok(path)
    }

    /// Read back the entry for an item, if one was written.
    pub async fn read(&self, id: &BaseId, stage: StageKind) -> StageResult<Option<DecisionLogEntry>> {
        let path = self.path_for(id, stage);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_overwrites_previous_entry() {
        let dir = TempDir::new().unwrap();
        let log = DecisionLog::new(dir.path().join("logs"));
        let id = BaseId::new("talk").unwrap();

        let failed = DecisionLogEntry::failure("talk.mp4", StageKind::Transcribe, "File not found: x");
        log.record(&id, StageKind::Transcribe, &failed).await.unwrap();

        let ok = DecisionLogEntry::success("talk.mp4", StageKind::Transcribe);
        let path = log.record(&id, StageKind::Transcribe, &ok).await.unwrap();

        assert_eq!(path, dir.path().join("logs/talk_transcribe.json"));
        let read = log.read(&id, StageKind::Transcribe).await.unwrap().unwrap();
        assert!(read.is_success());

        // A single JSON document, not an appended stream.
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["stage"], "transcribe");
        assert_eq!(value["file"], "talk.mp4");
    }

    #[tokio::test]
    async fn test_read_missing_entry() {
        let dir = TempDir::new().unwrap();
        let log = DecisionLog::new(dir.path());
        let id = BaseId::new("absent").unwrap();
        assert!(log.read(&id, StageKind::Cut).await.unwrap().is_none());
    }
}
