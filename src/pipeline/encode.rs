//! Image encoding: `DynamicImage` → JPEG or PNG bytes.
//!
//! JPEG does not carry alpha, and pdfium hands back RGBA bitmaps, so JPEG
//! pages are flattened to RGB first. Both encoders are deterministic: the
//! same bitmap and quality always give the same bytes.

use crate::config::PageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page in the configured format.
pub fn encode_page(
    img: &DynamicImage,
    format: PageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        PageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            encoder.encode_image(&rgb)?;
        }
        PageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
    }
    debug!(
        "Encoded {}x{} image → {} bytes {}",
        img.width(),
        img.height(),
        buf.len(),
        format.extension()
    );
    Ok(buf)
}
