//! # pagecast
//!
//! Turn an upload batch into an ordered sequence of publicly addressable
//! page images.
//!
//! ## What it does
//!
//! A caller hands over either one paginated document (a PDF) or a set of
//! standalone page images. pagecast classifies the batch, rasterises
//! document pages at a fixed 1.5× scale via pdfium, persists every
//! resulting image through a pluggable storage backend, and returns the
//! ordered locator list a viewer can page through. Page order, gapless
//! indices, batch isolation and temp-resource cleanup are guaranteed on
//! every path, success or failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload files
//!  │
//!  ├─ 1. Classify  document (single PDF) vs collection (pass-through)
//!  ├─ 2. Intake    scoped temp resources, released on every exit path
//!  ├─ 3. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Encode    fresh surface per page → lossless PNG
//!  ├─ 5. Publish   store each item in strict source order
//!  └─ 6. Output    ordered locator list + per-batch stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagecast::{process_upload, PublishConfig, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("report.pdf")?;
//!     let files = vec![SourceFile::from_bytes("report.pdf", "application/pdf", bytes)];
//!
//!     // Defaults to filesystem storage at public/uploads, served as /uploads.
//!     let config = PublishConfig::default();
//!     let output = process_upload(files, &config).await?;
//!     for locator in output.locators() {
//!         println!("{locator}");
//!     }
//!     eprintln!("{} pages in {}ms", output.stats.pages, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagecast` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pagecast = { version = "0.1", default-features = false }
//! ```
//!
//! ## Pdfium
//!
//! Rendering binds the system pdfium library at run time. Install
//! libpdfium, or point `PDFIUM_DYNAMIC_LIB_PATH` at an existing copy.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{classify, BatchMode, FileContent, SourceFile, UploadBatch};
pub use config::{PublishConfig, PublishConfigBuilder, StorageSettings};
pub use error::{PagecastError, StorageError};
pub use output::{BatchId, PublishOutput, PublishStats, PublishedAsset};
pub use process::process_upload;
pub use storage::{FsStorage, S3Storage, StorageBackend};
