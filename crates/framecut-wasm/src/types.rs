//! WASM-compatible wrapper types for the crop pipeline.
//!
//! Rects and dimensions cross the boundary as plain JavaScript objects via
//! `serde-wasm-bindgen`; decoded images stay in WASM memory behind
//! [`JsSourceImage`].

use std::fmt::Display;
use std::rc::Rc;

use framecut_core::SourceImage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A decoded source image held in WASM memory.
///
/// Decode once when the dialog opens, then pass the handle to every export.
#[wasm_bindgen]
pub struct JsSourceImage {
    inner: Rc<SourceImage>,
}

#[wasm_bindgen]
impl JsSourceImage {
    /// Decode JPEG, PNG, or WebP bytes, applying EXIF orientation.
    pub fn decode(bytes: &[u8]) -> Result<JsSourceImage, JsValue> {
        SourceImage::decode(bytes)
            .map(JsSourceImage::from_source)
            .map_err(js_error)
    }

    /// Wrap raw RGB pixel data (3 bytes per pixel, row-major order).
    #[wasm_bindgen(js_name = fromRgb)]
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsSourceImage, JsValue> {
        SourceImage::from_rgb(width, height, pixels)
            .map(JsSourceImage::from_source)
            .map_err(js_error)
    }

    /// Natural width in pixels.
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.natural_size().0
    }

    /// Natural height in pixels.
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.natural_size().1
    }
}

impl JsSourceImage {
    pub(crate) fn from_source(source: SourceImage) -> Self {
        Self {
            inner: Rc::new(source),
        }
    }

    /// Shared handle for futures that outlive the call.
    pub(crate) fn shared(&self) -> Rc<SourceImage> {
        Rc::clone(&self.inner)
    }
}

/// Convert any pipeline error into a JavaScript `Error`.
pub(crate) fn js_error(err: impl Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// `null` for `None`, the serialized value otherwise.
pub(crate) fn option_to_js<T: Serialize>(value: Option<&T>) -> Result<JsValue, JsValue> {
    match value {
        Some(v) => to_js(v),
        None => Ok(JsValue::NULL),
    }
}
