//! Ordered publishing: drive the storage backend in strict source order.
//!
//! Keys are derived deterministically from the batch-unique prefix plus the
//! page index (document mode) or upload order and sanitised filename
//! (collection mode). Zero-padding keeps a lexicographic listing of the
//! backend in page order.
//!
//! The first failing `store` aborts the run with
//! [`PagecastError::Publish`]. Items already stored under earlier indices
//! are left in the backend — the core keeps no manifest it could roll back
//! from, and the orphaned keys are unreachable without the locator list
//! that was never returned.

use crate::batch::SourceFile;
use crate::error::PagecastError;
use crate::output::{BatchId, PublishedAsset};
use crate::pipeline::intake::BatchScope;
use crate::pipeline::render::RenderedPage;
use crate::storage::StorageBackend;
use bytes::Bytes;
use slug::slugify;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Storage key for a rendered document page.
pub fn page_key(batch_id: &BatchId, index: usize) -> String {
    format!("{}/page-{:04}.png", batch_id, index)
}

/// Storage key for a pass-through collection file.
///
/// The order prefix keeps two identically named uploads in one batch from
/// colliding and keeps backend listings sorted by page order.
pub fn collection_key(batch_id: &BatchId, order: usize, original_name: &str) -> String {
    format!("{}/{:04}-{}", batch_id, order, sanitize_filename(original_name))
}

/// Reduce an untrusted upload filename to a safe key segment.
fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

/// Persist rendered pages in index order.
///
/// Returns the published assets plus the total bytes handed to the backend.
pub async fn publish_pages(
    storage: &Arc<dyn StorageBackend>,
    batch_id: &BatchId,
    pages: Vec<RenderedPage>,
) -> Result<(Vec<PublishedAsset>, u64), PagecastError> {
    let mut assets = Vec::with_capacity(pages.len());
    let mut bytes_stored = 0u64;

    for page in pages {
        let key = page_key(batch_id, page.index);
        let payload = Bytes::from(page.image);
        bytes_stored += payload.len() as u64;

        let locator = storage
            .store(&key, payload, "image/png")
            .await
            .map_err(|source| PagecastError::Publish {
                index: page.index,
                source,
            })?;

        debug!("published page {} → {}", page.index, locator);
        assets.push(PublishedAsset {
            order: page.index,
            locator,
        });
    }

    Ok((assets, bytes_stored))
}

/// Persist collection files as-is, in upload order.
///
/// Content bytes are passed through untouched with the declared media type;
/// no re-encoding happens in collection mode.
pub async fn publish_files(
    storage: &Arc<dyn StorageBackend>,
    batch_id: &BatchId,
    scope: &BatchScope,
    files: &[SourceFile],
) -> Result<(Vec<PublishedAsset>, u64), PagecastError> {
    let mut assets = Vec::with_capacity(files.len());
    let mut bytes_stored = 0u64;

    for (i, file) in files.iter().enumerate() {
        let order = i + 1;
        let key = collection_key(batch_id, order, &file.name);
        let payload = scope.load_content(file).await?;
        bytes_stored += payload.len() as u64;

        let locator = storage
            .store(&key, payload, &file.media_type)
            .await
            .map_err(|source| PagecastError::Publish { index: order, source })?;

        debug!("published file '{}' as item {} → {}", file.name, order, locator);
        assets.push(PublishedAsset { order, locator });
    }

    Ok((assets, bytes_stored))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> BatchId {
        BatchId::new()
    }

    #[test]
    fn page_keys_are_zero_padded_and_prefixed() {
        let batch = id();
        assert_eq!(page_key(&batch, 1), format!("{batch}/page-0001.png"));
        assert_eq!(page_key(&batch, 37), format!("{batch}/page-0037.png"));
    }

    #[test]
    fn page_keys_sort_in_page_order() {
        let batch = id();
        let mut keys: Vec<String> = (1..=12).map(|i| page_key(&batch, i)).collect();
        let in_order = keys.clone();
        keys.sort();
        assert_eq!(keys, in_order);
    }

    #[test]
    fn collection_keys_carry_order_and_sanitised_name() {
        let batch = id();
        assert_eq!(
            collection_key(&batch, 2, "My Scan (final).PNG"),
            format!("{batch}/0002-my-scan-final.png")
        );
    }

    #[test]
    fn sanitize_strips_paths_and_oddities() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("photo.JPG"), "photo.jpg");
        assert_eq!(sanitize_filename("ünïcode nämé.png"), "unicode-name.png");
        assert_eq!(sanitize_filename("...."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn identical_names_get_distinct_keys() {
        let batch = id();
        let a = collection_key(&batch, 1, "a.png");
        let b = collection_key(&batch, 2, "a.png");
        assert_ne!(a, b);
    }
}
