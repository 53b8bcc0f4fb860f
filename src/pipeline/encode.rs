//! Image encoding: rasterised page → PNG or JPEG bytes.
//!
//! PNG keeps the page exactly as rendered, alpha included. JPEG has no alpha
//! channel, so pages are first composited onto an opaque white background;
//! transparent regions come out white rather than black.

use crate::config::ImageFormat;
use crate::pipeline::raster::PageImage;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat as CodecFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Encode one page in `format`. `jpeg_quality` is ignored for PNG.
pub fn encode_page(
    page: &PageImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Png => {
            page.image
                .write_to(&mut Cursor::new(&mut buf), CodecFormat::Png)?;
        }
        ImageFormat::Jpeg { .. } => {
            let flat = flatten_onto_white(&page.image);
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            encoder.encode_image(&flat)?;
        }
    }
    debug!(
        "Encoded page {} as {} → {} bytes",
        page.index,
        format,
        buf.len()
    );
    Ok(buf)
}

/// Composite `img` over opaque white, dropping the alpha channel.
///
/// Fully transparent pixels become pure white; fully opaque pixels are
/// unchanged. The blend is integer-rounded, so the result is deterministic.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        out.put_pixel(x, y, Rgb([blend(r, a), blend(g, a), blend(b, a)]));
    }
    out
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (channel as u32, alpha as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
