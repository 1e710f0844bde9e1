//! Error types for the crop pipeline.
//!
//! Every failure is returned to the immediate caller. Nothing in the pipeline
//! retries or substitutes an empty result.

use thiserror::Error;

use crate::session::SessionState;
use crate::source::DecodeError;

/// Errors produced while selecting, projecting, or exporting a crop.
#[derive(Debug, Error)]
pub enum CropError {
    /// Commit was attempted before any rectangle was set.
    #[error("No crop selection has been made")]
    NoSelection,

    /// Projection was attempted before the displayed image was measured.
    #[error("Image has not been measured: display size is zero")]
    UnmeasuredImage,

    /// No drawing surface could be acquired for the requested output size.
    #[error("Rasterization surface unavailable for {width}x{height}: {reason}")]
    RasterizationUnavailable {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Serialization of the rasterized surface produced no output.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The rectangle has negative or non-finite components, or covers no pixels.
    #[error("Invalid crop rectangle: {0}")]
    InvalidRect(String),

    /// Aspect ratios must be finite and strictly positive.
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(f64),

    /// Export was requested while the session had no committed rectangle.
    #[error("Session is not committed (state: {0:?})")]
    NotCommitted(SessionState),

    /// The image source could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
