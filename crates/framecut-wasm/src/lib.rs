//! Framecut WASM - WebAssembly bindings for the crop dialog
//!
//! This crate exposes the framecut-core crop pipeline to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `types` - Source image handle and JS conversion helpers
//! - `session` - Crop session driven by the dialog's load/drag/apply events
//! - `export` - Stateless geometry helpers and the async JPEG export
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSourceImage, JsCropSession } from '@framecut/wasm';
//!
//! await init();
//!
//! const image = JsSourceImage.decode(new Uint8Array(await file.arrayBuffer()));
//! const session = new JsCropSession(1);
//! session.image_loaded(img.width, img.height, image.width, image.height);
//! session.commit();
//! const jpeg = await session.export(image);
//! ```

use wasm_bindgen::prelude::*;

mod export;
mod session;
mod types;

pub use export::{export_crop, initialize_crop, project_crop};
pub use session::JsCropSession;
pub use types::JsSourceImage;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
