//! Document rasterisation: render every page to an encoded PNG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the whole document render
//! onto the blocking pool so Tokio worker threads never stall on CPU-heavy
//! rasterisation.
//!
//! ## Page ordering and surface lifetime
//!
//! Pages are rendered strictly sequentially: page `i + 1` does not start
//! before page `i` has been encoded, because pdfium's render context is not
//! safe for concurrent multi-page use within one document. Each page gets a
//! freshly sized bitmap surface — page dimensions vary, and a shared
//! surface would either clip content or retain prior-page pixels.
//!
//! A failing page aborts the whole render with
//! [`PagecastError::PageRender`]; no partial page set is ever returned, so
//! a render failure can never leave orphaned assets in the backend.

use crate::config::PublishConfig;
use crate::error::PagecastError;
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// One rasterised page, ready to persist.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page index; the full sequence for a document is contiguous
    /// starting at 1, with no gaps or duplicates.
    pub index: usize,
    /// Encoded PNG bytes.
    pub image: Vec<u8>,
    /// Pixel width of the rendered surface.
    pub width: u32,
    /// Pixel height of the rendered surface.
    pub height: u32,
}

/// Rasterise every page of a document buffer, in page order.
///
/// # Errors
/// * [`PagecastError::CorruptDocument`] / [`PagecastError::PasswordRequired`]
///   / [`PagecastError::WrongPassword`] when the buffer cannot be opened.
/// * [`PagecastError::EmptyDocument`] when the document has zero pages.
/// * [`PagecastError::PageRender`] when any single page fails; nothing is
///   returned in that case.
pub async fn render_document(
    bytes: Vec<u8>,
    config: &PublishConfig,
) -> Result<Vec<RenderedPage>, PagecastError> {
    let scale = config.scale;
    let max_edge = config.max_surface_pixels;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        render_blocking(&bytes, scale, max_edge, password.as_deref())
    })
    .await
    .map_err(|e| PagecastError::Internal(format!("render task panicked: {e}")))?
}

/// Blocking implementation of the page loop.
fn render_blocking(
    bytes: &[u8],
    scale: f32,
    max_edge: u32,
    password: Option<&str>,
) -> Result<Vec<RenderedPage>, PagecastError> {
    // pdfium tolerates a surprising amount of garbage after the header, but
    // a buffer without the magic is never a document worth handing to it.
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(PagecastError::CorruptDocument {
            detail: "missing %PDF header".into(),
        });
    }

    let pdfium = Pdfium::new(
        Pdfium::bind_to_system_library()
            .map_err(|e| PagecastError::PdfiumBinding(format!("{e:?}")))?,
    );

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_open_error(e, password.is_some()))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if total == 0 {
        return Err(PagecastError::EmptyDocument);
    }
    info!("document opened: {} pages", total);

    let mut rendered = Vec::with_capacity(total);

    for i in 0..total {
        let index = i + 1;
        let page = pages
            .get(i as u16)
            .map_err(|e| PagecastError::PageRender {
                index,
                detail: format!("{e:?}"),
            })?;

        let (width, height) = surface_size(page.width().value, page.height().value, scale, max_edge);

        // Fresh surface per page: never reuse a bitmap across pages.
        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PagecastError::PageRender {
                index,
                detail: format!("{e:?}"),
            })?;

        let surface = bitmap.as_image();
        let image = encode::encode_png(&surface).map_err(|e| PagecastError::PageRender {
            index,
            detail: format!("PNG encoding failed: {e}"),
        })?;

        debug!(
            "rendered page {}/{} → {}x{} px, {} bytes",
            index,
            total,
            surface.width(),
            surface.height(),
            image.len()
        );

        rendered.push(RenderedPage {
            index,
            image,
            width: surface.width(),
            height: surface.height(),
        });
    }

    Ok(rendered)
}

/// Compute the render surface for a page of `w_pts × h_pts` points.
///
/// Dimensions are the page's natural size times the scale factor, shrunk
/// proportionally only if the longest edge exceeds `max_edge`.
fn surface_size(w_pts: f32, h_pts: f32, scale: f32, max_edge: u32) -> (u32, u32) {
    let mut w = (w_pts * scale).round().max(1.0);
    let mut h = (h_pts * scale).round().max(1.0);

    let longest = w.max(h);
    if longest > max_edge as f32 {
        let shrink = max_edge as f32 / longest;
        w = (w * shrink).round().max(1.0);
        h = (h * shrink).round().max(1.0);
    }

    (w as u32, h as u32)
}

/// Map a pdfium open failure onto the document-open error class.
fn classify_open_error(e: PdfiumError, password_supplied: bool) -> PagecastError {
    let detail = format!("{e:?}");
    if detail.contains("Password") || detail.contains("password") {
        if password_supplied {
            PagecastError::WrongPassword
        } else {
            PagecastError::PasswordRequired
        }
    } else {
        PagecastError::CorruptDocument { detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_applies_uniform_scale() {
        // US Letter: 612×792 pts × 1.5 → 918×1188 px.
        assert_eq!(surface_size(612.0, 792.0, 1.5, 10_000), (918, 1188));
        // A 200×300 pt page → 300×450 px.
        assert_eq!(surface_size(200.0, 300.0, 1.5, 10_000), (300, 450));
    }

    #[test]
    fn surface_size_caps_longest_edge_proportionally() {
        let (w, h) = surface_size(20_000.0, 10_000.0, 1.5, 10_000);
        assert_eq!(w, 10_000);
        assert_eq!(h, 5_000);
    }

    #[test]
    fn surface_size_never_collapses_to_zero() {
        let (w, h) = surface_size(0.1, 0.1, 1.5, 10_000);
        assert!(w >= 1 && h >= 1);
    }

    #[tokio::test]
    async fn missing_magic_is_a_corrupt_document() {
        let config = PublishConfig::default();
        let err = render_document(b"not a document at all".to_vec(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, PagecastError::CorruptDocument { .. }));
    }
}
