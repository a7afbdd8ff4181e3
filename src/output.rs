//! Output types returned by the publish pipeline.

use crate::batch::BatchMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Batch-unique storage-key prefix.
///
/// Prefix uniqueness is the concurrency-safety mechanism of the whole
/// pipeline: concurrent batches write under disjoint prefixes, so no
/// locking is needed at the storage target. A random UUID (rather than a
/// timestamp) guarantees the prefix never collides across simultaneous
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted page or pass-through file. Immutable once created; the
/// core holds no reference to it after the response is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAsset {
    /// 1-based position, inherited from page index or upload order.
    pub order: usize,
    /// Public address returned by the storage backend.
    pub locator: String,
}

/// Timing and volume statistics for one publish run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishStats {
    /// Number of assets published (page count or file count).
    pub pages: usize,
    /// Total payload bytes handed to the storage backend.
    pub bytes_stored: u64,
    /// Time spent rasterising (zero in collection mode).
    pub render_duration_ms: u64,
    /// Time spent in storage writes.
    pub store_duration_ms: u64,
    /// Wall-clock time for the whole batch.
    pub total_duration_ms: u64,
}

/// Result of publishing one upload batch: the ordered locator list plus
/// run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutput {
    /// The batch's unique key prefix, for log correlation.
    pub batch_id: BatchId,
    /// How the batch was processed.
    pub mode: BatchMode,
    /// Published assets in source order: `assets[i]` is page `i + 1`.
    pub assets: Vec<PublishedAsset>,
    pub stats: PublishStats,
}

impl PublishOutput {
    /// The ordered locator list, as the downstream viewer consumes it.
    pub fn locators(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.locator.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ids_are_unique_and_path_safe() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn locators_follow_asset_order() {
        let output = PublishOutput {
            batch_id: BatchId::new(),
            mode: BatchMode::Collection,
            assets: vec![
                PublishedAsset {
                    order: 1,
                    locator: "/uploads/x/0001-a.png".into(),
                },
                PublishedAsset {
                    order: 2,
                    locator: "/uploads/x/0002-b.png".into(),
                },
            ],
            stats: PublishStats::default(),
        };
        assert_eq!(
            output.locators(),
            vec!["/uploads/x/0001-a.png", "/uploads/x/0002-b.png"]
        );
    }

    #[test]
    fn output_serialises_to_json() {
        let output = PublishOutput {
            batch_id: BatchId::new(),
            mode: BatchMode::Document,
            assets: vec![],
            stats: PublishStats::default(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"document\""));
    }
}
