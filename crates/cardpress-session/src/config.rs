//! Operator-facing editor settings.

use cardpress_core::brush::{MAX_BRUSH_DIAMETER, MIN_BRUSH_DIAMETER};
use cardpress_core::crop::{BoundsMode, FillMode};
use cardpress_core::AspectRatio;
use serde::{Deserialize, Serialize};

/// The editor's configuration surface.
///
/// Persisted alongside the template; unknown or out-of-range values are
/// normalized on load rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Crop aspect ratio constraint.
    pub aspect_ratio: AspectRatio,
    /// Whether the crop rectangle may leave the image.
    pub bounds_mode: BoundsMode,
    /// Fill for uncovered area on out-of-bounds crops.
    pub fill_mode: FillMode,
    /// Repair brush diameter in image-space pixels (1 to 100).
    pub brush_diameter: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Free,
            bounds_mode: BoundsMode::Strict,
            fill_mode: FillMode::Transparent,
            brush_diameter: 20.0,
        }
    }
}

impl EditorSettings {
    /// Clamp every field into its documented range.
    pub fn sanitized(mut self) -> Self {
        self.brush_diameter = if self.brush_diameter.is_finite() {
            self.brush_diameter
                .clamp(MIN_BRUSH_DIAMETER, MAX_BRUSH_DIAMETER)
        } else {
            Self::default().brush_diameter
        };
        self
    }
}
