//! Crop geometry in display and natural image space.
//!
//! The user selects a rectangle over the image as it is rendered on screen
//! (display space). Exporting reads pixels from the full-resolution asset
//! (natural space), so the selection has to be reprojected first.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y grows downwards
//! - Percent rects are expressed in 0..100 of the displayed extents
//! - Pixel rects are expressed in display pixels
//! - Projected rects are expressed in natural pixels and are never rounded here;
//!   rounding happens once, at the rasterization boundary

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Measurements of one image as rendered on screen and at full resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDimensions {
    /// Rendered width in CSS pixels.
    pub display_width: f64,
    /// Rendered height in CSS pixels.
    pub display_height: f64,
    /// Width of the original asset.
    pub natural_width: f64,
    /// Height of the original asset.
    pub natural_height: f64,
}

impl ImageDimensions {
    pub fn new(
        display_width: f64,
        display_height: f64,
        natural_width: f64,
        natural_height: f64,
    ) -> Self {
        Self {
            display_width,
            display_height,
            natural_width,
            natural_height,
        }
    }

    /// True once the rendered image has a positive size on both axes.
    pub fn is_measured(&self) -> bool {
        self.display_width > 0.0 && self.display_height > 0.0
    }

    /// Horizontal display-to-natural scale factor.
    pub fn scale_x(&self) -> f64 {
        self.natural_width / self.display_width
    }

    /// Vertical display-to-natural scale factor.
    pub fn scale_y(&self) -> f64 {
        self.natural_height / self.display_height
    }
}

/// Width-to-height ratio of a crop selection.
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio(1.0);

    pub fn new(value: f64) -> Result<Self, CropError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(CropError::InvalidAspectRatio(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Wider than tall.
    pub fn is_landscape(self) -> bool {
        self.0 > 1.0
    }
}

impl TryFrom<f64> for AspectRatio {
    type Error = CropError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AspectRatio> for f64 {
    fn from(aspect: AspectRatio) -> Self {
        aspect.0
    }
}

/// Unit of a [`CropRect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropUnit {
    /// Percentage (0..100) of the displayed image extents.
    #[serde(rename = "%")]
    Percent,
    /// Display pixels.
    #[default]
    #[serde(rename = "px")]
    Pixel,
}

/// A crop selection in display space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    #[serde(default)]
    pub unit: CropUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Rect in display pixels.
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Pixel,
            x,
            y,
            width,
            height,
        }
    }

    /// Rect in percent of the displayed extents.
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    /// Convert to display pixels. Pixel rects are returned unchanged.
    pub fn to_pixels(&self, display_width: f64, display_height: f64) -> Self {
        match self.unit {
            CropUnit::Pixel => *self,
            CropUnit::Percent => Self::pixels(
                self.x * display_width / 100.0,
                self.y * display_height / 100.0,
                self.width * display_width / 100.0,
                self.height * display_height / 100.0,
            ),
        }
    }

    /// Convert to percent of the displayed extents.
    pub fn to_percent(&self, display_width: f64, display_height: f64) -> Self {
        match self.unit {
            CropUnit::Percent => *self,
            CropUnit::Pixel => Self::percent(
                self.x / display_width * 100.0,
                self.y / display_height * 100.0,
                self.width / display_width * 100.0,
                self.height / display_height * 100.0,
            ),
        }
    }

    /// Scale width and height by `k`, keeping the origin.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            width: self.width * k,
            height: self.height * k,
            ..*self
        }
    }

    /// Width over height, or `None` for a zero-height rect.
    pub fn aspect(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    /// Check that all components are finite and the extents are non-negative.
    pub fn validate(&self) -> Result<(), CropError> {
        let components = [self.x, self.y, self.width, self.height];
        if components.iter().any(|v| !v.is_finite()) {
            return Err(CropError::InvalidRect(format!(
                "non-finite component in {:?}",
                self
            )));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(CropError::InvalidRect(format!(
                "negative size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A crop rectangle in natural image pixels.
///
/// Only produced by [`project`] or [`ProjectedRect::new`]; it has no setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Whole-pixel source region inside a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ProjectedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Intersection with a `natural_width` x `natural_height` image.
    ///
    /// Returns `None` when no area of the rect lies inside the image.
    pub fn clip_to(&self, natural_width: u32, natural_height: u32) -> Option<ProjectedRect> {
        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = (self.x + self.width).min(natural_width as f64);
        let bottom = (self.y + self.height).min(natural_height as f64);

        if !(right > left && bottom > top) {
            return None;
        }

        Some(ProjectedRect::new(left, top, right - left, bottom - top))
    }

    /// Whole source pixels touched by the rect, clipped to a
    /// `natural_width` x `natural_height` image.
    ///
    /// Edges are widened with floor/ceil so a fractional origin stays inside
    /// the returned region. Returns `None` when nothing of the rect remains
    /// inside the image.
    pub fn pixel_bounds(&self, natural_width: u32, natural_height: u32) -> Option<SourceBounds> {
        let visible = self.clip_to(natural_width, natural_height)?;

        let left = visible.x.floor() as u32;
        let top = visible.y.floor() as u32;
        let right = (visible.x + visible.width).ceil().min(natural_width as f64) as u32;
        let bottom = (visible.y + visible.height).ceil().min(natural_height as f64) as u32;

        Some(SourceBounds {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// Reproject a display-space selection into natural image pixels.
///
/// Each axis is scaled independently by `natural / display`. Percent rects
/// are converted to display pixels first. No rounding is applied.
///
/// # Errors
///
/// - [`CropError::UnmeasuredImage`] if either display extent is zero
/// - [`CropError::InvalidRect`] if the rect has negative or non-finite components
pub fn project(rect: &CropRect, dims: &ImageDimensions) -> Result<ProjectedRect, CropError> {
    if !dims.is_measured() {
        return Err(CropError::UnmeasuredImage);
    }
    rect.validate()?;

    let px = rect.to_pixels(dims.display_width, dims.display_height);
    let (scale_x, scale_y) = (dims.scale_x(), dims.scale_y());

    let projected = ProjectedRect {
        x: px.x * scale_x,
        y: px.y * scale_y,
        width: px.width * scale_x,
        height: px.height * scale_y,
    };

    tracing::debug!(?rect, scale_x, scale_y, ?projected, "projected crop");

    Ok(projected)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dims_strategy() -> impl Strategy<Value = ImageDimensions> {
        (1.0f64..=2000.0, 1.0f64..=2000.0, 1.0f64..=8000.0, 1.0f64..=8000.0)
            .prop_map(|(dw, dh, nw, nh)| ImageDimensions::new(dw, dh, nw, nh))
    }

    fn rect_strategy() -> impl Strategy<Value = CropRect> {
        (0.0f64..=1000.0, 0.0f64..=1000.0, 0.0f64..=1000.0, 0.0f64..=1000.0)
            .prop_map(|(x, y, w, h)| CropRect::pixels(x, y, w, h))
    }

    proptest! {
        /// Property: scaling the selection size scales the projected size by the same factor.
        #[test]
        fn prop_project_is_scale_linear(
            dims in dims_strategy(),
            rect in rect_strategy(),
            k in 0.01f64..=10.0,
        ) {
            let scaled_first = project(&rect.scaled(k), &dims).unwrap();
            let base = project(&rect, &dims).unwrap();

            let tol = 1e-9 * (1.0 + base.width().abs().max(base.height().abs()) * k);
            prop_assert_eq!(scaled_first.x(), base.x());
            prop_assert_eq!(scaled_first.y(), base.y());
            prop_assert!((scaled_first.width() - base.width() * k).abs() <= tol);
            prop_assert!((scaled_first.height() - base.height() * k).abs() <= tol);
        }

        /// Property: projection is deterministic.
        #[test]
        fn prop_project_is_pure(
            dims in dims_strategy(),
            rect in rect_strategy(),
        ) {
            let a = project(&rect, &dims).unwrap();
            let b = project(&rect, &dims).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Property: zero display width always fails, whatever the rect.
        #[test]
        fn prop_unmeasured_always_fails(
            rect in rect_strategy(),
            dh in 0.0f64..=1000.0,
        ) {
            let dims = ImageDimensions::new(0.0, dh, 800.0, 600.0);
            prop_assert!(matches!(project(&rect, &dims), Err(CropError::UnmeasuredImage)));
        }

        /// Property: pixel bounds never leave the image.
        #[test]
        fn prop_pixel_bounds_inside_image(
            (x, y, w, h) in (-100.0f64..=500.0, -100.0f64..=500.0, 0.0f64..=600.0, 0.0f64..=600.0),
            (nw, nh) in (1u32..=400, 1u32..=400),
        ) {
            let rect = ProjectedRect::new(x, y, w, h);
            if let Some(b) = rect.pixel_bounds(nw, nh) {
                prop_assert!(b.width >= 1 && b.height >= 1);
                prop_assert!(b.x + b.width <= nw);
                prop_assert!(b.y + b.height <= nh);

                // The whole visible part of the rect is covered.
                let visible = rect.clip_to(nw, nh).unwrap();
                prop_assert!(b.x as f64 <= visible.x());
                prop_assert!(b.y as f64 <= visible.y());
                prop_assert!((b.x + b.width) as f64 + 1e-9 >= visible.x() + visible.width());
                prop_assert!((b.y + b.height) as f64 + 1e-9 >= visible.y() + visible.height());
            }
        }
    }
}
