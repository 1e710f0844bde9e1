//! Crop geometry and export WASM bindings.
//!
//! # Functions
//!
//! - [`initialize_crop`] - Centered starting rect for an aspect
//! - [`project_crop`] - Display-space rect to natural pixels
//! - [`export_crop`] - Rasterize and encode a projected rect (returns a Promise)
//!
//! # Example
//!
//! ```typescript
//! import { JsSourceImage, project_crop, export_crop } from '@framecut/wasm';
//!
//! const image = JsSourceImage.decode(new Uint8Array(await file.arrayBuffer()));
//! const projected = project_crop(rect, {
//!   displayWidth: img.width, displayHeight: img.height,
//!   naturalWidth: image.width, naturalHeight: image.height,
//! });
//! const jpeg: Uint8Array = await export_crop(image, projected, 1);
//! ```

use framecut_core::{AspectRatio, CropRect, ImageDimensions, ProjectedRect};
use js_sys::{Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::{from_js, js_error, option_to_js, to_js, JsSourceImage};

/// Parse an optional aspect from JavaScript. `undefined` means free-form.
pub(crate) fn parse_aspect(aspect: Option<f64>) -> Result<Option<AspectRatio>, JsValue> {
    aspect.map(AspectRatio::new).transpose().map_err(js_error)
}

/// Centered starting rect in display pixels, or `null` for free-form crops.
#[wasm_bindgen]
pub fn initialize_crop(
    display_width: f64,
    display_height: f64,
    aspect: Option<f64>,
) -> Result<JsValue, JsValue> {
    let dims = ImageDimensions::new(display_width, display_height, display_width, display_height);
    let rect = framecut_core::initialize_crop(&dims, parse_aspect(aspect)?);
    option_to_js(rect.as_ref())
}

/// Reproject a display-space rect (`{ unit, x, y, width, height }`) into
/// natural image pixels.
#[wasm_bindgen]
pub fn project_crop(rect: JsValue, dims: JsValue) -> Result<JsValue, JsValue> {
    let rect: CropRect = from_js(rect)?;
    let dims: ImageDimensions = from_js(dims)?;
    let projected = framecut_core::project(&rect, &dims).map_err(js_error)?;
    to_js(&projected)
}

/// Rasterize and encode a projected rect as JPEG.
///
/// The returned Promise resolves once with a `Uint8Array`, or rejects once
/// with an `Error`.
#[wasm_bindgen]
pub fn export_crop(
    image: &JsSourceImage,
    projected: JsValue,
    aspect: Option<f64>,
) -> Result<Promise, JsValue> {
    let projected: ProjectedRect = from_js(projected)?;
    let aspect = parse_aspect(aspect)?;
    let source = image.shared();

    Ok(future_to_promise(async move {
        let exported = framecut_core::export_crop_async(&source, &projected, aspect)
            .await
            .map_err(js_error)?;
        Ok(Uint8Array::from(exported.bytes()).into())
    }))
}

/// Tests for the bindings that do not touch `JsValue`.
///
/// Conversions to and from JavaScript only work on wasm32 targets; the
/// underlying behavior is covered in `framecut_core`.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_uses_display_space() {
        let dims = ImageDimensions::new(300.0, 200.0, 300.0, 200.0);
        let rect = framecut_core::initialize_crop(&dims, Some(AspectRatio::SQUARE)).unwrap();
        assert!(rect.x + rect.width <= 300.0);
        assert!(rect.y + rect.height <= 200.0);
    }
}
