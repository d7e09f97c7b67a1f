//! JPEG codec boundary — the only place that talks to the `image` crate.
//!
//! The spec treats the JPEG codec as an external collaborator (§1): decoding
//! and re-encoding are consumed, not reimplemented. This module is the thin
//! seam the rest of the store talks through, so swapping codecs later never
//! touches `store/`.

use crate::error::Result;
use image::{GenericImageView, ImageFormat};
use std::io::Cursor;

/// JPEG quality used when re-encoding thumbnail/small variants.
const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Decode just enough of a JPEG to report `(width, height)`.
///
/// Mirrors `get_resolution()` in the original: no resizing, just dimensions.
pub fn dimensions(buffer: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()
        .map_err(|e| crate::error::Error::ImgLib(e.to_string()))?;
    match reader.into_dimensions() {
        Ok(dims) => Ok(dims),
        Err(_) => {
            // Some encoders omit the metadata a cheap dimension probe needs;
            // fall back to a full decode.
            let img = image::load_from_memory(buffer)?;
            Ok(img.dimensions())
        }
    }
}

/// Decode the original JPEG, shrink it to fit within `target_w x target_h`
/// (aspect ratio preserved, never upscaled — matches `vips_thumbnail_image`
/// constrained on width with height as the secondary bound), and re-encode
/// as JPEG.
pub fn thumbnail_jpeg(buffer: &[u8], target_w: u16, target_h: u16) -> Result<Vec<u8>> {
    let img = image::load_from_memory(buffer)?;
    let resized = img.thumbnail(target_w as u32, target_h as u32);

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, THUMBNAIL_JPEG_QUALITY);
    resized
        .write_with_encoder(encoder)
        .map_err(|e| crate::error::Error::ImgLib(e.to_string()))?;
    Ok(out)
}

/// Sanity check used by `insert`: the buffer must actually decode as JPEG.
pub fn is_jpeg(buffer: &[u8]) -> bool {
    image::guess_format(buffer) == Ok(ImageFormat::Jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_jpeg(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        });
        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, 90);
        image::DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .unwrap();
        out
    }

    #[test]
    fn dimensions_roundtrip() {
        let buf = make_jpeg(37, 41);
        let (w, h) = dimensions(&buf).unwrap();
        assert_eq!((w, h), (37, 41));
    }

    #[test]
    fn thumbnail_fits_bounding_box() {
        let buf = make_jpeg(400, 200);
        let thumb = thumbnail_jpeg(&buf, 64, 64).unwrap();
        let (w, h) = dimensions(&thumb).unwrap();
        assert!(w <= 64 && h <= 64);
        assert!(is_jpeg(&thumb));
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(!is_jpeg(b"not a jpeg"));
    }
}
