//! Crop session state.
//!
//! A [`CropSession`] owns the selection for one image in one dialog:
//!
//! ```text
//! Unselected -> Selecting -> Committed -> Exported
//!                                     \-> Failed
//! ```
//!
//! Auto-initialization or the first adjustment moves to `Selecting`, an
//! explicit [`CropSession::commit`] freezes the rect, and
//! [`CropSession::export`] consumes it. A failed export may be retried with
//! the same committed rect, and any new adjustment restarts selection.
//!
//! `export` borrows the session mutably, so a session can never have two
//! exports in flight.

use serde::{Deserialize, Serialize};

use crate::config::CropConfig;
use crate::error::CropError;
use crate::export::{export_crop_async, ExportedImage};
use crate::geometry::{project, AspectRatio, CropRect, ImageDimensions};
use crate::source::SourceImage;

/// Lifecycle of a crop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Unselected,
    Selecting,
    Committed,
    Exported,
    Failed,
}

/// Centered rect with the exact `aspect`, covering `fill` of the
/// constraining display axis.
fn centered_rect(dims: &ImageDimensions, aspect: AspectRatio, fill: f64) -> Option<CropRect> {
    if !dims.is_measured() {
        return None;
    }

    let a = aspect.value();
    let max_width = dims.display_width * fill;
    let max_height = dims.display_height * fill;

    let (width, height) = if max_width / a <= max_height {
        (max_width, max_width / a)
    } else {
        (max_height * a, max_height)
    };

    Some(CropRect::pixels(
        (dims.display_width - width) / 2.0,
        (dims.display_height - height) / 2.0,
        width,
        height,
    ))
}

/// Initial selection for a freshly loaded image.
///
/// With an aspect, returns a rect in display pixels, centered, sized to 90%
/// of the constraining axis, with `width / height == aspect`. Free-form
/// crops (`None`) and unmeasured images get no automatic rect.
pub fn initialize_crop(dims: &ImageDimensions, aspect: Option<AspectRatio>) -> Option<CropRect> {
    centered_rect(dims, aspect?, CropConfig::default().fill())
}

/// Selection state for one image.
#[derive(Debug, Clone)]
pub struct CropSession {
    aspect: Option<AspectRatio>,
    fill: f64,
    dims: Option<ImageDimensions>,
    current: Option<CropRect>,
    committed: Option<CropRect>,
    state: SessionState,
}

impl CropSession {
    /// New session. `None` means free-form cropping.
    pub fn new(aspect: Option<AspectRatio>) -> Self {
        Self {
            aspect,
            fill: CropConfig::default().fill(),
            dims: None,
            current: None,
            committed: None,
            state: SessionState::Unselected,
        }
    }

    /// New session configured from `config`; a missing `requested` aspect
    /// falls back to `config.default_aspect`.
    pub fn with_config(config: &CropConfig, requested: Option<f64>) -> Result<Self, CropError> {
        let aspect = config.resolve_aspect(requested)?;
        Ok(Self {
            fill: config.fill(),
            ..Self::new(aspect)
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn aspect(&self) -> Option<AspectRatio> {
        self.aspect
    }

    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.dims
    }

    /// Latest selection, committed or not.
    pub fn current(&self) -> Option<CropRect> {
        self.current
    }

    /// Frozen selection, if committed.
    pub fn committed(&self) -> Option<CropRect> {
        self.committed
    }

    /// Record the measured image and produce the automatic selection.
    ///
    /// Loading an image starts the session over.
    pub fn image_loaded(&mut self, dims: ImageDimensions) -> Option<CropRect> {
        self.dims = Some(dims);
        self.committed = None;
        self.current = self
            .aspect
            .and_then(|aspect| centered_rect(&dims, aspect, self.fill));
        self.state = if self.current.is_some() {
            SessionState::Selecting
        } else {
            SessionState::Unselected
        };

        tracing::debug!(?dims, initial = ?self.current, "crop image loaded");
        self.current
    }

    /// Replace the live selection. No validation happens here.
    pub fn update(&mut self, rect: CropRect) {
        if self.state != SessionState::Selecting {
            tracing::debug!(from = ?self.state, "crop selection restarted");
        }
        self.current = Some(rect);
        self.committed = None;
        self.state = SessionState::Selecting;
    }

    /// Pointer/drag handler: store the rect and hand it straight back.
    pub fn on_user_adjust(&mut self, rect: CropRect) -> CropRect {
        self.update(rect);
        rect
    }

    /// Freeze the latest selection for export.
    ///
    /// # Errors
    ///
    /// - [`CropError::NoSelection`] if no rect was ever set
    /// - [`CropError::InvalidRect`] for negative or non-finite rects
    pub fn commit(&mut self) -> Result<CropRect, CropError> {
        let rect = self.current.ok_or(CropError::NoSelection)?;
        rect.validate()?;

        self.committed = Some(rect);
        self.state = SessionState::Committed;
        tracing::debug!(?rect, "crop committed");
        Ok(rect)
    }

    /// Project, rasterize, and encode the committed rect.
    ///
    /// Allowed from `Committed`, and from `Failed` to retry the same rect.
    /// The session only changes state once the export has finished; a future
    /// dropped before then leaves it `Committed`.
    pub async fn export(&mut self, source: &SourceImage) -> Result<ExportedImage, CropError> {
        let rect = match (self.state, self.committed) {
            (SessionState::Committed | SessionState::Failed, Some(rect)) => rect,
            (state, _) => return Err(CropError::NotCommitted(state)),
        };

        let result = match self.dims {
            Some(dims) => match project(&rect, &dims) {
                Ok(projected) => export_crop_async(source, &projected, self.aspect).await,
                Err(e) => Err(e),
            },
            None => Err(CropError::UnmeasuredImage),
        };

        self.state = match &result {
            Ok(_) => SessionState::Exported,
            Err(e) => {
                tracing::warn!(error = %e, "crop export failed");
                SessionState::Failed
            }
        };
        result
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
