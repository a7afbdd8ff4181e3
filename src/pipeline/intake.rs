//! Batch lifecycle: scoped ownership of temporary input artifacts.
//!
//! ## Why a scope object?
//!
//! Temp files created while staging an upload must be released on every
//! exit path — success, document-open failure, render failure, publish
//! failure, or cancellation. Scattering cleanup calls at call sites loses
//! that guarantee the first time someone adds an early return. [`BatchScope`]
//! owns the batch's [`TempDir`] and tracked files, walks an explicit state
//! machine, and keeps a `Drop` safety net for cancelled tasks: dropping the
//! scope deletes the temp directory even when no release method ran.
//!
//! Release is idempotent and best-effort. A release failure (file already
//! gone, directory busy) is logged and never escalated, so it cannot mask
//! the processing error that triggered it.

use crate::batch::{FileContent, SourceFile};
use crate::error::PagecastError;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Lifecycle states of a batch's temp resources.
///
/// Every processing path terminates in one of the `Released*` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Temp resources exist; processing has not started.
    Acquired,
    /// The batch is being rendered/published.
    Processing,
    /// Released after the batch completed successfully.
    ReleasedOk,
    /// Released after a processing error.
    ReleasedAfterError,
}

/// Scoped owner of one batch's temporary inputs.
pub struct BatchScope {
    temp_dir: Option<TempDir>,
    tracked: Vec<PathBuf>,
    state: ScopeState,
}

impl BatchScope {
    /// Acquire a fresh temp scope for one batch.
    pub fn acquire() -> Result<Self, PagecastError> {
        let temp_dir =
            TempDir::new().map_err(|source| PagecastError::TempResource { source })?;
        debug!("batch scope acquired at {}", temp_dir.path().display());
        Ok(Self {
            temp_dir: Some(temp_dir),
            tracked: Vec::new(),
            state: ScopeState::Acquired,
        })
    }

    /// Mark the batch as in flight.
    pub fn begin(&mut self) {
        if self.state == ScopeState::Acquired {
            self.state = ScopeState::Processing;
        }
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Adopt a caller-staged file into the scope's release guarantee.
    ///
    /// Boundary layers stage uploads on disk before the batch exists; the
    /// resulting paths live outside the scope's own temp directory, so they
    /// must be tracked explicitly to be deleted on release.
    pub fn track(&mut self, path: PathBuf) {
        self.tracked.push(path);
    }

    /// Spool a buffer into the scope's temp directory and return its path.
    ///
    /// Boundary layers staging large multipart bodies on disk use this so
    /// the staged file inherits the scope's release guarantee.
    pub async fn spool(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, PagecastError> {
        let dir = self
            .temp_dir
            .as_ref()
            .ok_or_else(|| PagecastError::Internal("batch scope already released".into()))?;
        let path = dir.path().join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PagecastError::TempResource { source })?;
        self.tracked.push(path.clone());
        Ok(path)
    }

    /// Load a source file's payload into memory.
    pub async fn load_content(&self, file: &SourceFile) -> Result<Bytes, PagecastError> {
        match &file.content {
            FileContent::Buffer(bytes) => Ok(bytes.clone()),
            FileContent::TempFile(path) => read_temp(path).await,
        }
    }

    /// Release after successful publishing.
    pub async fn release_ok(&mut self) {
        self.release(ScopeState::ReleasedOk).await;
    }

    /// Release on any failure path.
    pub async fn release_after_error(&mut self) {
        self.release(ScopeState::ReleasedAfterError).await;
    }

    async fn release(&mut self, terminal: ScopeState) {
        if matches!(
            self.state,
            ScopeState::ReleasedOk | ScopeState::ReleasedAfterError
        ) {
            return;
        }

        for path in self.tracked.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                // Already gone counts as released.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to remove temp file {}: {}", path.display(), e),
            }
        }

        if let Some(dir) = self.temp_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("failed to remove temp dir {}: {}", path.display(), e);
            }
        }

        self.state = terminal;
        debug!("batch scope released: {:?}", terminal);
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        // Cancellation safety net: a dropped future never called a release
        // method, but the TempDir still deletes its tree on drop.
        if matches!(self.state, ScopeState::Acquired | ScopeState::Processing) {
            warn!("batch scope dropped mid-flight; temp resources removed on drop");
        }
    }
}

async fn read_temp(path: &Path) -> Result<Bytes, PagecastError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| PagecastError::TempResource { source })?;
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SourceFile;

    #[tokio::test]
    async fn spooled_files_are_deleted_on_release_ok() {
        let mut scope = BatchScope::acquire().unwrap();
        scope.begin();
        let path = scope.spool("input.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.is_file());

        scope.release_ok().await;
        assert_eq!(scope.state(), ScopeState::ReleasedOk);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_after_error_reaches_terminal_state() {
        let mut scope = BatchScope::acquire().unwrap();
        scope.begin();
        let path = scope.spool("input.pdf", b"garbage").await.unwrap();

        scope.release_after_error().await;
        assert_eq!(scope.state(), ScopeState::ReleasedAfterError);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_is_idempotent_and_sticky() {
        let mut scope = BatchScope::acquire().unwrap();
        scope.begin();
        scope.release_after_error().await;

        // A later release_ok must not flip the terminal state.
        scope.release_ok().await;
        assert_eq!(scope.state(), ScopeState::ReleasedAfterError);
    }

    #[tokio::test]
    async fn tracked_external_files_are_deleted_on_release() {
        // A caller-staged file lives outside the scope's own temp directory
        // but must still be removed on every exit path once adopted.
        let outside = tempfile::tempdir().unwrap();
        let path = outside.path().join("staged-upload.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let mut scope = BatchScope::acquire().unwrap();
        scope.track(path.clone());
        scope.begin();

        scope.release_after_error().await;
        assert!(!path.exists(), "adopted file must be deleted on release");
    }

    #[tokio::test]
    async fn missing_tracked_file_does_not_fail_release() {
        let mut scope = BatchScope::acquire().unwrap();
        let path = scope.spool("gone.bin", b"x").await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        scope.release_ok().await;
        assert_eq!(scope.state(), ScopeState::ReleasedOk);
    }

    #[tokio::test]
    async fn load_content_reads_buffers_and_temp_files() {
        let mut scope = BatchScope::acquire().unwrap();

        let buffered = SourceFile::from_bytes("a.png", "image/png", &b"buffered"[..]);
        assert_eq!(scope.load_content(&buffered).await.unwrap().as_ref(), b"buffered");

        let path = scope.spool("b.png", b"spooled").await.unwrap();
        let staged = SourceFile {
            name: "b.png".into(),
            media_type: "image/png".into(),
            content: FileContent::TempFile(path),
        };
        assert_eq!(scope.load_content(&staged).await.unwrap().as_ref(), b"spooled");
    }

    #[tokio::test]
    async fn drop_removes_temp_directory() {
        let dir_path;
        {
            let mut scope = BatchScope::acquire().unwrap();
            let path = scope.spool("x.bin", b"x").await.unwrap();
            dir_path = path.parent().unwrap().to_path_buf();
            // Simulate cancellation: scope dropped without release.
        }
        assert!(!dir_path.exists());
    }
}
