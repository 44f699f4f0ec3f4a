use image::codecs::jpeg::JpegEncoder;
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

use crate::errors::{AppError, Result};

/// Decode a HEIC/HEIF buffer and re-encode it as JPEG. Input that libheif
/// cannot parse (wrong format, truncated upload) surfaces as an
/// `ImageError`, which the route layer reports as 400.
pub fn heic_to_jpeg(input: &[u8], quality: u8) -> Result<Vec<u8>> {
    let lib_heif = LibHeif::new();
    let context = HeifContext::read_from_bytes(input)
        .map_err(|e| AppError::ImageError(format!("Not a readable HEIC file: {}", e)))?;
    let handle = context
        .primary_image_handle()
        .map_err(|e| AppError::ImageError(format!("HEIC has no primary image: {}", e)))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| AppError::ImageError(format!("HEIC decode failed: {}", e)))?;

    let width = decoded.width();
    let height = decoded.height();
    let planes = decoded.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| AppError::ImageError("HEIC decode produced no RGB plane".to_string()))?;

    // The decoder may pad rows; copy row by row at the pixel width.
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let start = y * interleaved.stride;
        pixels.extend_from_slice(&interleaved.data[start..start + row_bytes]);
    }

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality)
        .encode(&pixels, width, height, image::ColorType::Rgb8)
        .map_err(|e| AppError::ImageError(format!("JPEG encode failed: {}", e)))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_input_is_rejected_not_panicked() {
        let err = heic_to_jpeg(b"definitely not an image", 85).unwrap_err();
        assert!(matches!(err, AppError::ImageError(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(heic_to_jpeg(&[], 85).is_err());
    }
}
