//! Filesystem-backed storage: writes under a served root directory.
//!
//! Locators are relative public paths (`{public_base}/{key}`) meant to be
//! served by a static-file layer sitting in front of `root`. Keys arrive
//! already unique per batch, so writes never overwrite existing assets.

use crate::error::StorageError;
use crate::storage::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Storage backend rooted at a local directory.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    public_base: String,
}

impl FsStorage {
    /// Initialise storage rooted at `root`, creating it if necessary.
    ///
    /// `public_base` is the URL prefix under which `root` is served
    /// (e.g. `/uploads`); a trailing slash is stripped.
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key to an absolute path, rejecting anything that escapes
    /// the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for FsStorage {
    async fn store(
        &self,
        key: &str,
        content: Bytes,
        _media_type: &str,
    ) -> Result<String, StorageError> {
        let absolute = self.resolve(key)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&absolute, &content).await?;
        debug!("stored {} bytes at {}", content.len(), absolute.display());
        Ok(format!("{}/{}", self.public_base, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_writes_bytes_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "/uploads/").unwrap();

        let locator = storage
            .store("batch1/page-0001.png", Bytes::from_static(b"pngbytes"), "image/png")
            .await
            .unwrap();

        assert_eq!(locator, "/uploads/batch1/page-0001.png");
        let written = std::fs::read(dir.path().join("batch1/page-0001.png")).unwrap();
        assert_eq!(written, b"pngbytes");
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "/uploads").unwrap();

        for key in ["../escape.png", "/etc/passwd"] {
            let err = storage
                .store(key, Bytes::from_static(b"x"), "image/png")
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key: {key}");
        }
    }

    #[tokio::test]
    async fn nested_key_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path(), "/u").unwrap();

        storage
            .store("a/b/c.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        assert!(dir.path().join("a/b/c.png").is_file());
    }
}
