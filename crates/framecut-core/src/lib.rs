//! Framecut Core - crop selection and export library
//!
//! This crate provides the image crop pipeline behind the Framecut crop
//! dialog: the interactive selection state, reprojection of the on-screen
//! selection into source pixels, and rasterizing and encoding the result.
//!
//! # Pipeline
//!
//! 1. [`CropSession::image_loaded`] derives a centered rect for the aspect
//! 2. [`CropSession::on_user_adjust`] tracks the live selection
//! 3. [`CropSession::commit`] freezes it
//! 4. [`CropSession::export`] projects it with [`project`] and hands the
//!    result to [`export::export_crop`]
//!
//! The library emits `tracing` events but never installs a subscriber.

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod session;
pub mod source;

pub use config::CropConfig;
pub use error::CropError;
pub use export::{export_crop, export_crop_async, ExportFormat, ExportedImage};
pub use geometry::{project, AspectRatio, CropRect, CropUnit, ImageDimensions, ProjectedRect};
pub use session::{initialize_crop, CropSession, SessionState};
pub use source::{DecodeError, SourceImage};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[tokio::test]
    async fn test_dialog_flow_landscape_banner() {
        let source =
            SourceImage::from_rgb_image(RgbImage::from_pixel(3000, 1000, Rgb([10, 20, 30])));
        let aspect = AspectRatio::new(3.0).unwrap();
        let mut session = CropSession::new(Some(aspect));

        let initial = session
            .image_loaded(source.dimensions_at(600.0, 200.0))
            .unwrap();
        assert!((initial.aspect().unwrap() - 3.0).abs() < 1e-6);

        session.commit().unwrap();
        let exported = session.export(&source).await.unwrap();

        // 90% of 600 display px is 540, scaled 5x to 2700 natural px.
        let (w, h) = exported.decoded_dimensions().unwrap();
        assert_eq!((w, h), (2700, 900));
        assert_eq!(session.state(), SessionState::Exported);
    }

    #[test]
    fn test_percent_selection_through_public_api() {
        let dims = ImageDimensions::new(400.0, 300.0, 1600.0, 1200.0);
        let rect = CropRect::percent(12.5, 25.0, 25.0, 25.0);

        let projected = project(&rect, &dims).unwrap();

        assert_eq!(projected, ProjectedRect::new(200.0, 300.0, 400.0, 300.0));
    }
}
