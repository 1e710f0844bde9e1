//! JPEG encoding for exported crops.
//!
//! Uses the `image` crate's JPEG encoder. The export quality is a fixed
//! policy constant; callers cannot tune it.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use crate::error::CropError;

/// Quality factor applied to every export (0.0 to 1.0).
pub const EXPORT_QUALITY: f32 = 0.95;

/// Map a 0.0-1.0 quality factor onto the encoder's 1-100 scale.
fn jpeg_quality(factor: f32) -> u8 {
    (factor * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - Quality factor (0.0 to 1.0), clamped to the encoder's range
///
/// # Errors
///
/// Returns [`CropError::Encode`] if the dimensions are zero, the buffer length
/// does not match, the encoder fails, or the encoder produced no bytes.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: f32,
) -> Result<Vec<u8>, CropError> {
    if width == 0 || height == 0 {
        return Err(CropError::Encode(format!(
            "invalid dimensions {}x{}",
            width, height
        )));
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(CropError::Encode(format!(
            "expected {} bytes of pixel data, got {}",
            expected_len,
            pixels.len()
        )));
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CropError::Encode(e.to_string()))?;

    if buffer.is_empty() {
        return Err(CropError::Encode("encoder produced no output".to_string()));
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_quality_maps_to_95() {
        assert_eq!(jpeg_quality(EXPORT_QUALITY), 95);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(2.0), 100);
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let pixels = vec![128u8; 64 * 64 * 3];
        let jpeg = encode_jpeg(&pixels, 64, 64, EXPORT_QUALITY).unwrap();

        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_zero_dimensions() {
        assert!(matches!(
            encode_jpeg(&[], 0, 10, EXPORT_QUALITY),
            Err(CropError::Encode(_))
        ));
        assert!(matches!(
            encode_jpeg(&[], 10, 0, EXPORT_QUALITY),
            Err(CropError::Encode(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_length_mismatch() {
        let pixels = vec![0u8; 10 * 9 * 3];
        assert!(matches!(
            encode_jpeg(&pixels, 10, 10, EXPORT_QUALITY),
            Err(CropError::Encode(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_deterministic() {
        let pixels: Vec<u8> = (0..20 * 20 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let a = encode_jpeg(&pixels, 20, 20, EXPORT_QUALITY).unwrap();
        let b = encode_jpeg(&pixels, 20, 20, EXPORT_QUALITY).unwrap();
        assert_eq!(a, b);
    }
}
