//! Crop dialog configuration.

use serde::{Deserialize, Serialize};

use crate::error::CropError;
use crate::geometry::AspectRatio;

/// Knobs the hosting dialog may set.
///
/// Export quality and the output floors are fixed policy and live in
/// [`crate::export`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropConfig {
    /// Aspect applied when the caller does not pass one. `None` means free-form.
    pub default_aspect: Option<f64>,
    /// Fraction of the constraining display axis covered by the initial rect.
    pub initial_fill: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            default_aspect: Some(1.0),
            initial_fill: 0.9,
        }
    }
}

impl CropConfig {
    /// Resolve the aspect for a dialog invocation, falling back to `default_aspect`.
    pub fn resolve_aspect(&self, requested: Option<f64>) -> Result<Option<AspectRatio>, CropError> {
        requested
            .or(self.default_aspect)
            .map(AspectRatio::new)
            .transpose()
    }

    /// `initial_fill` limited to (0, 1]. Out-of-range values fall back to the default.
    pub fn fill(&self) -> f64 {
        if self.initial_fill.is_finite() && self.initial_fill > 0.0 {
            self.initial_fill.min(1.0)
        } else {
            Self::default().initial_fill
        }
    }
}
