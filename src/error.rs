//! Error types for the pagecast library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`PagecastError`] — the single fatal taxonomy returned from
//!   [`crate::process::process_upload`]. Any variant aborts the whole batch:
//!   there is no silent partial success, and no partial locator list is ever
//!   returned.
//!
//! * [`StorageError`] — failures raised by a [`crate::storage::StorageBackend`]
//!   implementation. Carried as the `source` of [`PagecastError::Publish`] so
//!   callers can distinguish "which item failed" from "why the backend
//!   refused it".
//!
//! Cleanup-release failures are deliberately absent from both: the batch
//! scope logs them and never lets them mask the original processing error.

use thiserror::Error;

/// All fatal errors returned by the pagecast library.
#[derive(Debug, Error)]
pub enum PagecastError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied a batch with zero files.
    #[error("Upload batch is empty: at least one file is required")]
    EmptyBatch,

    // ── Document errors ───────────────────────────────────────────────────
    /// The document buffer could not be parsed (corrupt header, bad xref,
    /// unsupported version).
    #[error("Document cannot be opened: {detail}\nThe upload is not a parsable PDF.")]
    CorruptDocument { detail: String },

    /// The document is encrypted and no password was provided.
    #[error("Document is encrypted and requires a password.\nProvide one via PublishConfig::password.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted document")]
    WrongPassword,

    /// The document opened successfully but contains zero pages.
    #[error("Document has no pages to render")]
    EmptyDocument,

    /// A specific page failed to rasterise or encode. The whole document
    /// render aborts; no pages from this batch are published.
    #[error("Rendering failed on page {index}: {detail}")]
    PageRender { index: usize, detail: String },

    // ── Publish errors ────────────────────────────────────────────────────
    /// A specific item failed to persist. Remaining items are not attempted;
    /// items already stored under earlier indices remain in the backend.
    #[error("Failed to persist item {index}")]
    Publish {
        index: usize,
        #[source]
        source: StorageError,
    },

    // ── Lifecycle errors ──────────────────────────────────────────────────
    /// Could not acquire or use the batch's scoped temp resources.
    #[error("Failed to stage temp resources for the batch")]
    TempResource {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or storage-settings validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium and make it discoverable, or point\n\
PDFIUM_DYNAMIC_LIB_PATH at an existing copy."
    )]
    PdfiumBinding(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PagecastError {
    /// True when the failure was caused by the uploaded input itself rather
    /// than by the pipeline or its backends.
    ///
    /// The HTTP layer sitting above the core uses this to map errors onto a
    /// bad-request response class instead of a generic server fault, without
    /// matching every variant by hand.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PagecastError::EmptyBatch
                | PagecastError::CorruptDocument { .. }
                | PagecastError::PasswordRequired
                | PagecastError::WrongPassword
                | PagecastError::EmptyDocument
        )
    }
}

/// Failures raised by a storage backend while persisting one item.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The derived key escapes the backend's root (absolute path or `..`).
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// Filesystem write failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The object-storage SDK rejected the write.
    #[error("object storage write failed for key '{key}': {detail}")]
    Remote { key: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_render_display_names_the_page() {
        let e = PagecastError::PageRender {
            index: 2,
            detail: "bitmap allocation failed".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("bitmap allocation failed"));
    }

    #[test]
    fn publish_display_carries_source() {
        use std::error::Error as _;
        let e = PagecastError::Publish {
            index: 3,
            source: StorageError::Remote {
                key: "b/page-0003.png".into(),
                detail: "503 slow down".into(),
            },
        };
        assert!(e.to_string().contains("item 3"));
        let source = e.source().expect("publish error must expose its cause");
        assert!(source.to_string().contains("b/page-0003.png"));
    }

    #[test]
    fn invalid_input_classification() {
        assert!(PagecastError::EmptyBatch.is_invalid_input());
        assert!(PagecastError::EmptyDocument.is_invalid_input());
        assert!(PagecastError::WrongPassword.is_invalid_input());
        assert!(PagecastError::CorruptDocument { detail: "x".into() }.is_invalid_input());
        assert!(!PagecastError::Internal("x".into()).is_invalid_input());
        assert!(!PagecastError::Publish {
            index: 1,
            source: StorageError::InvalidKey("k".into()),
        }
        .is_invalid_input());
    }

    #[test]
    fn invalid_key_display() {
        let e = StorageError::InvalidKey("../escape".into());
        assert!(e.to_string().contains("../escape"));
    }
}
