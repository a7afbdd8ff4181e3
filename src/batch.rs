//! Upload batch types and the processing-mode classifier.
//!
//! A batch is either a **document** (exactly one file whose declared media
//! type names a paginated-document format, rasterised page by page) or a
//! **collection** (one or more standalone files published as-is, in upload
//! order). The mode is derived here, never client-supplied.

use crate::error::PagecastError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media types that identify a paginated-document upload.
///
/// Parameters (`;charset=...`) are stripped and the comparison is
/// case-insensitive. The declared type is used only for classification; the
/// rasterisation engine validates the actual bytes itself.
const DOCUMENT_MEDIA_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

/// One uploaded item. The name and media type are untrusted caller input.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original filename as supplied by the uploader (opaque, untrusted).
    pub name: String,
    /// Declared content type (untrusted; classification only).
    pub media_type: String,
    /// The payload itself, in memory or staged on disk.
    pub content: FileContent,
}

impl SourceFile {
    /// Convenience constructor for an in-memory upload.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: FileContent::Buffer(bytes.into()),
        }
    }
}

/// Where an uploaded payload currently lives.
///
/// Boundary layers that spool large multipart bodies to disk hand over a
/// `TempFile` path; the batch scope owns its deletion.
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Payload held in memory. `Bytes` makes clones cheap.
    Buffer(Bytes),
    /// Payload staged in a temp file tracked by the batch scope.
    TempFile(PathBuf),
}

/// Processing mode for one batch, derived by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// The single uploaded file is a paginated document; page order comes
    /// from the document itself.
    Document,
    /// Uploaded files are standalone pages; upload order is page order.
    Collection,
}

/// The unit of work for one request: the uploaded files plus their derived
/// processing mode. Never persisted; destroyed when the response is emitted.
#[derive(Debug)]
pub struct UploadBatch {
    files: Vec<SourceFile>,
    mode: BatchMode,
}

impl UploadBatch {
    /// Build a batch from uploaded files, deriving the processing mode.
    ///
    /// # Errors
    /// [`PagecastError::EmptyBatch`] when `files` is empty.
    pub fn new(files: Vec<SourceFile>) -> Result<Self, PagecastError> {
        let mode = classify(&files)?;
        Ok(Self { files, mode })
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Files in upload order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Consume the batch, yielding its files in upload order.
    pub fn into_files(self) -> Vec<SourceFile> {
        self.files
    }
}

/// Decide the processing mode for a set of uploaded files.
///
/// Pure and side-effect free: `Document` if and only if the batch holds
/// exactly one file whose declared media type is a paginated-document
/// format; any other non-empty batch is a `Collection`.
pub fn classify(files: &[SourceFile]) -> Result<BatchMode, PagecastError> {
    if files.is_empty() {
        return Err(PagecastError::EmptyBatch);
    }
    if files.len() == 1 && is_document_media_type(&files[0].media_type) {
        return Ok(BatchMode::Document);
    }
    Ok(BatchMode::Collection)
}

fn is_document_media_type(declared: &str) -> bool {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    DOCUMENT_MEDIA_TYPES.contains(&essence.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: &str) -> SourceFile {
        SourceFile::from_bytes(name, media_type, vec![0u8; 4])
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = classify(&[]).unwrap_err();
        assert!(matches!(err, PagecastError::EmptyBatch));
    }

    #[test]
    fn single_pdf_is_document() {
        let files = vec![file("report.pdf", "application/pdf")];
        assert_eq!(classify(&files).unwrap(), BatchMode::Document);
    }

    #[test]
    fn media_type_parameters_and_case_are_ignored() {
        let files = vec![file("report.pdf", "Application/PDF; charset=binary")];
        assert_eq!(classify(&files).unwrap(), BatchMode::Document);

        let files = vec![file("legacy.pdf", "application/x-pdf")];
        assert_eq!(classify(&files).unwrap(), BatchMode::Document);
    }

    #[test]
    fn single_image_is_collection() {
        let files = vec![file("a.png", "image/png")];
        assert_eq!(classify(&files).unwrap(), BatchMode::Collection);
    }

    #[test]
    fn two_pdfs_are_collection() {
        // "Document" requires exactly one file; two documents fall back to
        // pass-through publishing.
        let files = vec![
            file("a.pdf", "application/pdf"),
            file("b.pdf", "application/pdf"),
        ];
        assert_eq!(classify(&files).unwrap(), BatchMode::Collection);
    }

    #[test]
    fn mixed_batch_is_collection() {
        let files = vec![
            file("a.png", "image/png"),
            file("report.pdf", "application/pdf"),
        ];
        assert_eq!(classify(&files).unwrap(), BatchMode::Collection);
    }

    #[test]
    fn upload_batch_preserves_file_order() {
        let batch = UploadBatch::new(vec![
            file("first.png", "image/png"),
            file("second.png", "image/png"),
        ])
        .unwrap();
        assert_eq!(batch.mode(), BatchMode::Collection);
        let names: Vec<&str> = batch.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first.png", "second.png"]);
    }
}
