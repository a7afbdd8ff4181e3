//! Pipeline stages for document rasterisation and asset publishing.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets a backend be
//! swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ render ──▶ encode ──▶ publish
//! (scope)    (pdfium)   (PNG)      (storage)
//! ```
//!
//! 1. [`intake`]  — scoped ownership of the batch's temp inputs; release is
//!    guaranteed on every exit path
//! 2. [`render`]  — rasterise document pages in strict index order; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]  — PNG-encode each rendered surface (called from within
//!    the render page loop, so page `i`'s encode completes before page
//!    `i + 1` starts)
//! 4. [`publish`] — persist each item through the storage backend in
//!    source order and collect the locator list
//!
//! Collection mode skips `render`/`encode` entirely: files go straight
//! from `intake` to `publish` untouched.

pub mod encode;
pub mod intake;
pub mod publish;
pub mod render;
