//! Image encoding: `DynamicImage` → PNG bytes.
//!
//! PNG is the fixed output format for every rendered page. It is lossless,
//! so the viewer shows exactly the pixels pdfium produced — text crispness
//! matters far more than file size for document pages, and JPEG artefacts
//! around rendered glyphs are immediately visible at the viewer's zoom
//! levels.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page surface as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("encoded {}x{} surface → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let bytes = encode_png(&img).expect("encode should succeed");
        // PNG magic
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n']);

        let decoded = image::load_from_memory(&bytes).expect("valid PNG");
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 10);
    }
}
