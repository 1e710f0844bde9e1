//! Image sources for the crop pipeline.
//!
//! A [`SourceImage`] holds the full-resolution RGB pixels the export reads
//! from. Decoding sniffs the container format and applies EXIF orientation,
//! so the natural size matches what a browser reports for the same file.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader, RgbImage};
use thiserror::Error;

use crate::geometry::ImageDimensions;

/// Error types for source decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image is recognized but corrupted or truncated.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Pixel buffer length does not match the stated dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },
}

/// EXIF orientation values (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90CW,
    Transverse,
    Rotate270CW,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

impl Orientation {
    fn read(bytes: &[u8]) -> Self {
        let mut cursor = Cursor::new(bytes);
        Reader::new()
            .read_from_container(&mut cursor)
            .ok()
            .and_then(|exif| {
                exif.get_field(Tag::Orientation, In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .map(Orientation::from)
            .unwrap_or_default()
    }

    fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate90CW => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate270CW => img.rotate270(),
        }
    }
}

/// Full-resolution RGB image the export reads pixels from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbImage,
}

impl SourceImage {
    /// Decode an encoded image (JPEG, PNG, WebP), applying EXIF orientation.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let orientation = Orientation::read(bytes);

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
        if reader.format().is_none() {
            return Err(DecodeError::InvalidFormat);
        }

        let img = reader
            .decode()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

        let pixels = orientation.apply(img).into_rgb8();
        tracing::debug!(
            width = pixels.width(),
            height = pixels.height(),
            ?orientation,
            "decoded crop source"
        );

        Ok(Self { pixels })
    }

    /// Build a source from raw RGB pixel data (3 bytes per pixel, row-major).
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        let actual = pixels.len();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or(DecodeError::InvalidPixelData {
                expected: usize::MAX,
                actual,
            })?;
        RgbImage::from_raw(width, height, pixels)
            .filter(|_| actual == expected)
            .map(|pixels| Self { pixels })
            .ok_or(DecodeError::InvalidPixelData { expected, actual })
    }

    pub fn from_rgb_image(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Width and height of the original asset.
    pub fn natural_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Pair the natural size with the size the image is rendered at.
    pub fn dimensions_at(&self, display_width: f64, display_height: f64) -> ImageDimensions {
        let (w, h) = self.natural_size();
        ImageDimensions::new(display_width, display_height, w as f64, h as f64)
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }
}
