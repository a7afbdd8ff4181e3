//! Storage backend capability.
//!
//! The pipeline persists every rendered page or pass-through file through
//! this single trait and never branches on which backend is configured.
//! Two implementations ship with the crate:
//!
//! * [`FsStorage`] — writes under a served root; locators are public paths.
//! * [`S3Storage`] — writes to an S3-compatible bucket; locators are URLs.
//!
//! Backends only ever see fresh, batch-unique keys, so `store` never needs
//! to handle overwrite semantics.

pub mod fs;
pub mod s3;

pub use fs::FsStorage;
pub use s3::S3Storage;

use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;

/// Persist a named byte buffer and return its public locator.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `content` under `key` with the given media type.
    ///
    /// Returns the public locator (a servable path or a fully qualified
    /// URL) at which the stored bytes can later be fetched.
    async fn store(
        &self,
        key: &str,
        content: Bytes,
        media_type: &str,
    ) -> Result<String, StorageError>;
}
