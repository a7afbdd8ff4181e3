//! The pipeline entry point: classify, render, publish, clean up.
//!
//! One upload batch is processed by a single logical task from intake to
//! response. Concurrent batches each get their own scope, render context
//! and batch-unique key prefix, so they share nothing but the storage
//! target itself.

use crate::batch::{BatchMode, FileContent, SourceFile, UploadBatch};
use crate::config::{PublishConfig, StorageSettings};
use crate::error::PagecastError;
use crate::output::{BatchId, PublishOutput, PublishStats};
use crate::pipeline::{intake::BatchScope, publish, render};
use crate::storage::{FsStorage, S3Storage, StorageBackend};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Storage location used when nothing else is configured: a directory the
/// static-file layer is expected to serve under `/uploads`.
const DEFAULT_FS_ROOT: &str = "public/uploads";
const DEFAULT_PUBLIC_BASE: &str = "/uploads";

/// Process one upload batch into an ordered list of published page assets.
///
/// This is the sole entry point the core exposes to the routing layer.
///
/// # Arguments
/// * `files`  — uploaded files in upload order (order is page order in
///   collection mode)
/// * `config` — publish configuration; storage is resolved from it
///
/// # Returns
/// `Ok(PublishOutput)` whose assets mirror the document's page count or the
/// collection's file count exactly — no reordering, skipping or
/// renumbering.
///
/// # Errors
/// Any failure aborts the whole batch; no partial locator list is
/// returned. Temp resources are released on every path.
pub async fn process_upload(
    files: Vec<SourceFile>,
    config: &PublishConfig,
) -> Result<PublishOutput, PagecastError> {
    let total_start = Instant::now();

    // ── Step 1: Classify ─────────────────────────────────────────────────
    let batch = UploadBatch::new(files)?;
    let batch_id = BatchId::new();
    info!(
        "batch {} classified as {:?} ({} files)",
        batch_id,
        batch.mode(),
        batch.files().len()
    );

    // ── Step 2: Resolve storage ──────────────────────────────────────────
    let storage = resolve_storage(config).await?;

    // ── Step 3: Acquire temp scope ───────────────────────────────────────
    // Caller-staged files are adopted here so release covers them too.
    let mut scope = BatchScope::acquire()?;
    for file in batch.files() {
        if let FileContent::TempFile(path) = &file.content {
            scope.track(path.clone());
        }
    }
    scope.begin();

    // ── Step 4: Render and publish, releasing the scope on either path ───
    let result = run_pipeline(&batch, &batch_id, &storage, &scope, config).await;
    match result {
        Ok((assets, stats_parts)) => {
            scope.release_ok().await;

            let stats = PublishStats {
                pages: assets.len(),
                bytes_stored: stats_parts.bytes_stored,
                render_duration_ms: stats_parts.render_duration_ms,
                store_duration_ms: stats_parts.store_duration_ms,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
            };
            info!(
                "batch {} published {} assets in {}ms",
                batch_id, stats.pages, stats.total_duration_ms
            );

            Ok(PublishOutput {
                batch_id,
                mode: batch.mode(),
                assets,
                stats,
            })
        }
        Err(e) => {
            scope.release_after_error().await;
            Err(e)
        }
    }
}

/// Timing and volume fragments collected while the pipeline runs.
struct StatsParts {
    bytes_stored: u64,
    render_duration_ms: u64,
    store_duration_ms: u64,
}

async fn run_pipeline(
    batch: &UploadBatch,
    batch_id: &BatchId,
    storage: &Arc<dyn StorageBackend>,
    scope: &BatchScope,
    config: &PublishConfig,
) -> Result<(Vec<crate::output::PublishedAsset>, StatsParts), PagecastError> {
    match batch.mode() {
        BatchMode::Document => {
            // ── Rasterise: all pages, strict order, or nothing ───────────
            let document = &batch.files()[0];
            let bytes = scope.load_content(document).await?;

            let render_start = Instant::now();
            let pages = render::render_document(bytes.to_vec(), config).await?;
            let render_duration_ms = render_start.elapsed().as_millis() as u64;
            debug!("rendered {} pages in {}ms", pages.len(), render_duration_ms);

            // ── Persist in page order ────────────────────────────────────
            let store_start = Instant::now();
            let (assets, bytes_stored) = publish::publish_pages(storage, batch_id, pages).await?;
            let store_duration_ms = store_start.elapsed().as_millis() as u64;

            Ok((
                assets,
                StatsParts {
                    bytes_stored,
                    render_duration_ms,
                    store_duration_ms,
                },
            ))
        }
        BatchMode::Collection => {
            // ── Pass files through untouched, in upload order ────────────
            let store_start = Instant::now();
            let (assets, bytes_stored) =
                publish::publish_files(storage, batch_id, scope, batch.files()).await?;
            let store_duration_ms = store_start.elapsed().as_millis() as u64;

            Ok((
                assets,
                StatsParts {
                    bytes_stored,
                    render_duration_ms: 0,
                    store_duration_ms,
                },
            ))
        }
    }
}

/// Resolve the storage backend, from most-specific to least-specific.
///
/// The fallback chain lets library users and deployments each set exactly
/// as much as they need:
///
/// 1. **Pre-built backend** (`config.storage`) — the caller constructed and
///    configured the backend entirely; used as-is. This is how tests inject
///    doubles and how callers add middleware.
///
/// 2. **Declarative settings** (`config.storage_settings`) — filesystem
///    root or S3 connection details; the backend is built here.
///
/// 3. **Environment** — `PAGECAST_STORAGE=s3` selects object storage
///    configured from `PAGECAST_S3_BUCKET`, `PAGECAST_S3_ENDPOINT`,
///    `PAGECAST_S3_ACCESS_KEY`, `PAGECAST_S3_SECRET_KEY` and optionally
///    `PAGECAST_S3_REGION` / `PAGECAST_S3_PUBLIC_BASE`. Any other value
///    selects the filesystem backend at `PAGECAST_FS_ROOT` (default
///    `public/uploads`) served under `PAGECAST_PUBLIC_BASE`.
///
/// 4. **Default** — filesystem backend at `public/uploads`, served under
///    `/uploads`.
pub async fn resolve_storage(
    config: &PublishConfig,
) -> Result<Arc<dyn StorageBackend>, PagecastError> {
    // 1) Caller-provided backend takes priority
    if let Some(ref storage) = config.storage {
        return Ok(Arc::clone(storage));
    }

    // 2) Declarative settings
    if let Some(ref settings) = config.storage_settings {
        return build_backend(settings).await;
    }

    // 3) Environment selection
    if let Ok(kind) = std::env::var("PAGECAST_STORAGE") {
        if kind.eq_ignore_ascii_case("s3") {
            let settings = StorageSettings::S3(crate::storage::s3::S3Settings {
                bucket: require_env("PAGECAST_S3_BUCKET")?,
                endpoint: require_env("PAGECAST_S3_ENDPOINT")?,
                region: std::env::var("PAGECAST_S3_REGION").ok(),
                access_key: require_env("PAGECAST_S3_ACCESS_KEY")?,
                secret_key: require_env("PAGECAST_S3_SECRET_KEY")?,
                public_base: std::env::var("PAGECAST_S3_PUBLIC_BASE").ok(),
            });
            return build_backend(&settings).await;
        }
        let settings = StorageSettings::Filesystem {
            root: std::env::var("PAGECAST_FS_ROOT")
                .unwrap_or_else(|_| DEFAULT_FS_ROOT.to_string())
                .into(),
            public_base: std::env::var("PAGECAST_PUBLIC_BASE")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE.to_string()),
        };
        return build_backend(&settings).await;
    }

    // 4) Default filesystem backend
    build_backend(&StorageSettings::Filesystem {
        root: DEFAULT_FS_ROOT.into(),
        public_base: DEFAULT_PUBLIC_BASE.to_string(),
    })
    .await
}

async fn build_backend(
    settings: &StorageSettings,
) -> Result<Arc<dyn StorageBackend>, PagecastError> {
    match settings {
        StorageSettings::Filesystem { root, public_base } => {
            let backend = FsStorage::new(root, public_base.clone()).map_err(|e| {
                PagecastError::InvalidConfig(format!(
                    "cannot initialise storage root '{}': {e}",
                    root.display()
                ))
            })?;
            Ok(Arc::new(backend))
        }
        StorageSettings::S3(s3) => Ok(Arc::new(S3Storage::connect(s3).await)),
    }
}

fn require_env(name: &str) -> Result<String, PagecastError> {
    std::env::var(name)
        .map_err(|_| PagecastError::InvalidConfig(format!("{name} must be set for S3 storage")))
}
