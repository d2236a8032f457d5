//! Filesystem helpers for temporary and final artifacts.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// A file that is deleted when the guard goes out of scope.
///
/// Used for intermediates such as the raw extracted audio track and
/// per-segment clips, so cleanup happens on every exit path. Removal
/// failures are logged at warn level and never escalate.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed temporary file: {}", self.path.display()),
            Err(e) => tracing::warn!(
                "Failed to remove temporary file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Write `contents` to `path` through a sibling temp file and a rename,
/// replacing any previous file so readers never see a partial artifact.
pub async fn write_atomic(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> MediaResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("partial");
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
