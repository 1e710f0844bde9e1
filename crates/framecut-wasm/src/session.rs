//! WASM bindings for the crop dialog session.
//!
//! The dialog creates one [`JsCropSession`] per opened image and forwards
//! image load, drag, apply and export events to it.
//!
//! ```typescript
//! const session = new JsCropSession(16 / 9);
//! const initial = session.image_loaded(img.width, img.height, image.width, image.height);
//! onChange = (rect) => session.update(rect);
//! onApply = async () => {
//!   session.commit();
//!   const jpeg = await session.export(image);
//! };
//! ```

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use framecut_core::{CropConfig, CropRect, CropSession, ImageDimensions};
use js_sys::{Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::{from_js, js_error, option_to_js, to_js, JsSourceImage};

/// Crop selection state for one image.
#[wasm_bindgen]
pub struct JsCropSession {
    inner: Rc<RefCell<CropSession>>,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session. An omitted aspect falls back to square.
    #[wasm_bindgen(constructor)]
    pub fn new(aspect: Option<f64>) -> Result<JsCropSession, JsValue> {
        CropSession::with_config(&CropConfig::default(), aspect)
            .map(JsCropSession::from_session)
            .map_err(js_error)
    }

    /// Create a session from a config object (`{ defaultAspect, initialFill }`).
    /// Pass `defaultAspect: null` for free-form cropping.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue, aspect: Option<f64>) -> Result<JsCropSession, JsValue> {
        let config: CropConfig = from_js(config)?;
        CropSession::with_config(&config, aspect)
            .map(JsCropSession::from_session)
            .map_err(js_error)
    }

    /// Record the measured image; returns the automatic rect or `null`.
    pub fn image_loaded(
        &self,
        display_width: f64,
        display_height: f64,
        natural_width: f64,
        natural_height: f64,
    ) -> Result<JsValue, JsValue> {
        let dims = ImageDimensions::new(display_width, display_height, natural_width, natural_height);
        let rect = self.session()?.image_loaded(dims);
        option_to_js(rect.as_ref())
    }

    /// Store the live selection and return it unchanged.
    pub fn update(&self, rect: JsValue) -> Result<JsValue, JsValue> {
        let rect: CropRect = from_js(rect)?;
        let rect = self.session()?.on_user_adjust(rect);
        to_js(&rect)
    }

    /// Latest selection, or `null`.
    pub fn current(&self) -> Result<JsValue, JsValue> {
        let rect = self.session()?.current();
        option_to_js(rect.as_ref())
    }

    /// Freeze the latest selection for export.
    pub fn commit(&self) -> Result<JsValue, JsValue> {
        let rect = self.session()?.commit().map_err(js_error)?;
        to_js(&rect)
    }

    /// Lifecycle state: `unselected`, `selecting`, `committed`, `exported` or `failed`.
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> Result<JsValue, JsValue> {
        let state = self.session()?.state();
        to_js(&state)
    }

    /// Export the committed selection as JPEG.
    ///
    /// Resolves once with a `Uint8Array` or rejects once with an `Error`.
    /// The work runs on the main thread inside a single microtask, so exports
    /// requested back to back run one after the other.
    #[allow(clippy::await_holding_refcell_ref)]
    pub fn export(&self, image: &JsSourceImage) -> Promise {
        let session = Rc::clone(&self.inner);
        let source = image.shared();

        future_to_promise(async move {
            // The core export never suspends, so this borrow is free here.
            let mut session = session
                .try_borrow_mut()
                .map_err(|_| js_error("an export is already in progress"))?;
            let exported = session.export(&source).await.map_err(js_error)?;
            Ok(Uint8Array::from(exported.bytes()).into())
        })
    }
}

impl JsCropSession {
    pub(crate) fn from_session(session: CropSession) -> Self {
        Self {
            inner: Rc::new(RefCell::new(session)),
        }
    }

    fn session(&self) -> Result<RefMut<'_, CropSession>, JsValue> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| js_error("crop session is busy exporting"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::{AspectRatio, SessionState};

    #[test]
    fn test_wrapped_session_starts_unselected() {
        let session = CropSession::new(Some(AspectRatio::SQUARE));
        let wrapped = JsCropSession::from_session(session);

        assert_eq!(wrapped.inner.borrow().state(), SessionState::Unselected);
    }

    #[test]
    fn test_wrapped_session_tracks_core_state() {
        let wrapped = JsCropSession::from_session(CropSession::new(None));
        wrapped
            .inner
            .borrow_mut()
            .update(CropRect::pixels(0.0, 0.0, 10.0, 10.0));

        assert_eq!(wrapped.inner.borrow().state(), SessionState::Selecting);
    }
}
