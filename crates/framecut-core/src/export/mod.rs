//! Crop export pipeline for Framecut.
//!
//! This module turns a projected crop into a compressed image:
//! - Sizing the output surface against the orientation floor
//! - Stretch-blitting the source region with Lanczos3 resampling
//! - Encoding the surface as JPEG at a fixed quality
//!
//! # Architecture
//!
//! [`export_crop`] is synchronous and does all the work in one call.
//! [`export_crop_async`] wraps it as a future that resolves exactly once.
//! That future does all of its work in its first poll: it gives callers a
//! single resolution point but does not move the resampling or encoding off
//! the polling thread. Each call acquires its own surface, so dropping a
//! future before it is polled leaves nothing shared behind.

mod encode;
mod raster;

use std::io::Cursor;

use image::ImageReader;

use crate::error::CropError;
use crate::geometry::{AspectRatio, ProjectedRect};
use crate::source::{DecodeError, SourceImage};

pub use encode::{encode_jpeg, EXPORT_QUALITY};
pub use raster::{
    output_size, rasterize, DefaultSurfaceProvider, OutputFloor, Surface, SurfaceProvider,
    MAX_SURFACE_AREA, MAX_SURFACE_EDGE,
};

/// Compressed format of an [`ExportedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// The finished artifact of an export. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl ExportedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Surface width the image was encoded from.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height the image was encoded from.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ExportFormat {
        ExportFormat::Jpeg
    }

    pub fn mime_type(&self) -> &'static str {
        self.format().mime_type()
    }

    /// Read the pixel dimensions back out of the encoded bytes.
    pub fn decoded_dimensions(&self) -> Result<(u32, u32), CropError> {
        let dims = ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?
            .into_dimensions()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
        Ok(dims)
    }
}

/// Rasterize and encode a projected crop using in-memory surfaces.
pub fn export_crop(
    source: &SourceImage,
    projected: &ProjectedRect,
    aspect: Option<AspectRatio>,
) -> Result<ExportedImage, CropError> {
    export_crop_with(source, projected, aspect, &DefaultSurfaceProvider)
}

/// Rasterize and encode a projected crop on surfaces from `provider`.
///
/// # Errors
///
/// - [`CropError::InvalidRect`] if the projected rect misses the source
/// - [`CropError::RasterizationUnavailable`] if no surface can be acquired
/// - [`CropError::Encode`] if serialization fails or produces no bytes
pub fn export_crop_with(
    source: &SourceImage,
    projected: &ProjectedRect,
    aspect: Option<AspectRatio>,
    provider: &dyn SurfaceProvider,
) -> Result<ExportedImage, CropError> {
    let surface = rasterize(source, projected, aspect, provider)?;
    let (width, height) = (surface.width(), surface.height());
    let bytes = encode_jpeg(surface.as_rgb_image().as_raw(), width, height, EXPORT_QUALITY)?;

    tracing::debug!(width, height, bytes = bytes.len(), "exported crop");

    Ok(ExportedImage {
        bytes,
        width,
        height,
    })
}

/// Awaitable form of [`export_crop`]. Resolves exactly once, with either the
/// image or the error.
///
/// The future never suspends. Rasterization and encoding run inside the
/// first poll on the caller's executor, so on wasm32 they block the main
/// thread for their duration just like [`export_crop`].
pub async fn export_crop_async(
    source: &SourceImage,
    projected: &ProjectedRect,
    aspect: Option<AspectRatio>,
) -> Result<ExportedImage, CropError> {
    export_crop(source, projected, aspect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{project, CropRect};
    use image::{Rgb, RgbImage};

    fn gradient_source(width: u32, height: u32) -> SourceImage {
        SourceImage::from_rgb_image(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    struct NoSurface;

    impl SurfaceProvider for NoSurface {
        fn acquire(&self, width: u32, height: u32) -> Result<Surface, CropError> {
            Err(CropError::RasterizationUnavailable {
                width,
                height,
                reason: "no canvas".to_string(),
            })
        }
    }

    #[test]
    fn test_tiny_landscape_export_meets_floor() {
        let source = gradient_source(100, 100);
        let projected = ProjectedRect::new(0.0, 0.0, 10.0, 10.0);
        let aspect = AspectRatio::new(2.0).unwrap();

        let exported = export_crop(&source, &projected, Some(aspect)).unwrap();

        let (w, h) = exported.decoded_dimensions().unwrap();
        assert!(w >= 1200 && h >= 600);
    }

    #[test]
    fn test_tiny_square_export_meets_floor() {
        let source = gradient_source(100, 100);
        let projected = ProjectedRect::new(0.0, 0.0, 10.0, 10.0);

        let exported = export_crop(&source, &projected, Some(AspectRatio::SQUARE)).unwrap();

        let (w, h) = exported.decoded_dimensions().unwrap();
        assert!(w >= 400 && h >= 400);
    }

    #[test]
    fn test_export_is_repeatable() {
        let source = gradient_source(300, 200);
        let projected = ProjectedRect::new(20.5, 10.25, 150.0, 120.0);

        let a = export_crop(&source, &projected, None).unwrap();
        let b = export_crop(&source, &projected, None).unwrap();

        assert_eq!(a.decoded_dimensions().unwrap(), b.decoded_dimensions().unwrap());
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn test_end_to_end_floor() {
        let source = gradient_source(1600, 1200);
        let dims = source.dimensions_at(400.0, 300.0);
        let rect = CropRect::pixels(50.0, 50.0, 100.0, 75.0);

        let projected = project(&rect, &dims).unwrap();
        assert_eq!(projected, ProjectedRect::new(200.0, 200.0, 400.0, 300.0));

        let exported = export_crop(&source, &projected, Some(AspectRatio::SQUARE)).unwrap();
        assert_eq!(exported.decoded_dimensions().unwrap(), (400, 400));
        assert_eq!((exported.width(), exported.height()), (400, 400));
    }

    #[test]
    fn test_export_large_selection_keeps_size() {
        let source = gradient_source(1000, 800);
        let projected = ProjectedRect::new(0.0, 0.0, 900.0, 700.0);

        let exported = export_crop(&source, &projected, None).unwrap();
        assert_eq!(exported.decoded_dimensions().unwrap(), (900, 700));
    }

    #[test]
    fn test_export_is_jpeg() {
        let source = gradient_source(50, 50);
        let projected = ProjectedRect::new(0.0, 0.0, 50.0, 50.0);

        let exported = export_crop(&source, &projected, None).unwrap();

        assert_eq!(exported.format(), ExportFormat::Jpeg);
        assert_eq!(exported.mime_type(), "image/jpeg");
        assert_eq!(ExportFormat::Jpeg.mime_type(), exported.mime_type());
        assert_eq!(&exported.bytes()[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_export_without_surface_fails() {
        let source = gradient_source(50, 50);
        let projected = ProjectedRect::new(0.0, 0.0, 50.0, 50.0);

        let result = export_crop_with(&source, &projected, None, &NoSurface);
        assert!(matches!(
            result,
            Err(CropError::RasterizationUnavailable { .. })
        ));
    }

    #[test]
    fn test_export_oversized_surface_fails() {
        let source = gradient_source(50, 50);
        let projected = ProjectedRect::new(0.0, 0.0, 20_000.0, 50.0);

        let result = export_crop(&source, &projected, None);
        assert!(matches!(
            result,
            Err(CropError::RasterizationUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_export_async_resolves_on_first_poll() {
        use std::future::Future;

        let source = gradient_source(60, 40);
        let projected = ProjectedRect::new(0.0, 0.0, 60.0, 40.0);

        let mut export = std::pin::pin!(export_crop_async(&source, &projected, None));
        let first_poll = std::future::poll_fn(|cx| {
            std::task::Poll::Ready(export.as_mut().poll(cx))
        })
        .await;

        assert!(matches!(first_poll, std::task::Poll::Ready(Ok(_))));
    }

    #[tokio::test]
    async fn test_export_async_matches_sync() {
        let source = gradient_source(120, 80);
        let projected = ProjectedRect::new(10.0, 10.0, 60.0, 40.0);

        let sync = export_crop(&source, &projected, None).unwrap();
        let async_result = export_crop_async(&source, &projected, None).await.unwrap();

        assert_eq!(sync, async_result);
    }
}
