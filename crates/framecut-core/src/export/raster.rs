//! Rasterization of a projected crop onto an output surface.
//!
//! The source region is read exactly as projected and stretched over the
//! whole surface with one uniform scale per axis. Parts of the projected rect
//! that fall outside the source stay blank. The surface is never smaller than
//! the orientation floor, so small selections are upscaled rather than
//! exported tiny.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::CropError;
use crate::geometry::{AspectRatio, ProjectedRect};
use crate::source::SourceImage;

/// Largest edge a surface may have, in pixels.
pub const MAX_SURFACE_EDGE: u32 = 16_384;

/// Largest pixel count a surface may have.
pub const MAX_SURFACE_AREA: u64 = 268_435_456;

/// Minimum output resolution for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFloor {
    pub min_width: u32,
    pub min_height: u32,
}

impl OutputFloor {
    /// Floor for landscape aspects (aspect > 1).
    pub const LANDSCAPE: OutputFloor = OutputFloor {
        min_width: 1200,
        min_height: 600,
    };

    /// Floor for square, portrait, and free-form crops.
    pub const STANDARD: OutputFloor = OutputFloor {
        min_width: 400,
        min_height: 400,
    };

    pub fn for_aspect(aspect: Option<AspectRatio>) -> Self {
        match aspect {
            Some(a) if a.is_landscape() => Self::LANDSCAPE,
            _ => Self::STANDARD,
        }
    }
}

/// Output surface size for a projected rect: the projected size, raised to
/// the floor on each axis and rounded to whole pixels.
pub fn output_size(projected: &ProjectedRect, aspect: Option<AspectRatio>) -> (u32, u32) {
    let floor = OutputFloor::for_aspect(aspect);
    let width = projected.width().max(floor.min_width as f64).round() as u32;
    let height = projected.height().max(floor.min_height as f64).round() as u32;
    (width, height)
}

/// An RGB drawing surface, exclusively owned by one export.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbImage,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }

    fn draw(&mut self, layer: &RgbImage, x: u32, y: u32) {
        imageops::replace(&mut self.pixels, layer, x as i64, y as i64);
    }
}

/// Hands out drawing surfaces.
pub trait SurfaceProvider {
    /// Acquire a blank `width` x `height` surface.
    fn acquire(&self, width: u32, height: u32) -> Result<Surface, CropError>;
}

/// In-memory surfaces, limited like a browser canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSurfaceProvider;

impl SurfaceProvider for DefaultSurfaceProvider {
    fn acquire(&self, width: u32, height: u32) -> Result<Surface, CropError> {
        let unavailable = |reason: String| CropError::RasterizationUnavailable {
            width,
            height,
            reason,
        };

        if width == 0 || height == 0 {
            return Err(unavailable("zero-sized surface".to_string()));
        }
        if width > MAX_SURFACE_EDGE || height > MAX_SURFACE_EDGE {
            return Err(unavailable(format!("edge exceeds {}", MAX_SURFACE_EDGE)));
        }
        if width as u64 * height as u64 > MAX_SURFACE_AREA {
            return Err(unavailable(format!("area exceeds {}", MAX_SURFACE_AREA)));
        }

        Ok(Surface {
            pixels: RgbImage::new(width, height),
        })
    }
}

/// Draw the projected region of `source` stretched over a fresh surface.
///
/// Source point `(x, y)` lands at
/// `((x - projected.x) * out_width / projected.width, ..)` on the surface.
/// Resampling always uses Lanczos3.
///
/// # Errors
///
/// - [`CropError::InvalidRect`] if the projected rect is under one source
///   pixel on either axis, or covers no source pixels
/// - whatever the provider returns when no surface is available
pub fn rasterize(
    source: &SourceImage,
    projected: &ProjectedRect,
    aspect: Option<AspectRatio>,
    provider: &dyn SurfaceProvider,
) -> Result<Surface, CropError> {
    let (natural_width, natural_height) = source.natural_size();
    let invalid = |why: &str| {
        CropError::InvalidRect(format!(
            "{:?} {} of a {}x{} image",
            projected, why, natural_width, natural_height
        ))
    };

    if !(projected.width() >= 1.0 && projected.height() >= 1.0) {
        return Err(invalid("is smaller than one pixel"));
    }
    let visible = projected
        .clip_to(natural_width, natural_height)
        .ok_or_else(|| invalid("covers no pixels"))?;
    let bounds = projected
        .pixel_bounds(natural_width, natural_height)
        .ok_or_else(|| invalid("covers no pixels"))?;

    let (out_width, out_height) = output_size(projected, aspect);
    let mut surface = provider.acquire(out_width, out_height)?;

    let scale_x = out_width as f64 / projected.width();
    let scale_y = out_height as f64 / projected.height();
    let scaled_len = |len: u32, scale: f64| (len as f64 * scale).round().max(1.0) as u32;
    let to_surface = |v: f64, origin: f64, scale: f64, max: u32| {
        ((v - origin) * scale).round().clamp(0.0, max as f64) as u32
    };

    let region = imageops::crop_imm(
        source.as_rgb_image(),
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
    )
    .to_image();
    let scaled = imageops::resize(
        &region,
        scaled_len(bounds.width, scale_x),
        scaled_len(bounds.height, scale_y),
        FilterType::Lanczos3,
    );

    // Visible part of the projected rect, on the surface and in `scaled`.
    let dest_x = to_surface(visible.x(), projected.x(), scale_x, out_width);
    let dest_y = to_surface(visible.y(), projected.y(), scale_y, out_height);
    let (visible_right, visible_bottom) = (
        visible.x() + visible.width(),
        visible.y() + visible.height(),
    );
    let dest_right = to_surface(visible_right, projected.x(), scale_x, out_width);
    let dest_bottom = to_surface(visible_bottom, projected.y(), scale_y, out_height);
    let offset_x = to_surface(visible.x(), bounds.x as f64, scale_x, scaled.width());
    let offset_y = to_surface(visible.y(), bounds.y as f64, scale_y, scaled.height());

    let width = dest_right
        .saturating_sub(dest_x)
        .min(scaled.width() - offset_x);
    let height = dest_bottom
        .saturating_sub(dest_y)
        .min(scaled.height() - offset_y);

    if width > 0 && height > 0 {
        let layer = imageops::crop_imm(&scaled, offset_x, offset_y, width, height).to_image();
        surface.draw(&layer, dest_x, dest_y);
    }

    tracing::debug!(
        ?bounds,
        dest_x,
        dest_y,
        width,
        height,
        out_width,
        out_height,
        "rasterized crop"
    );

    Ok(surface)
}
