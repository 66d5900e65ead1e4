//! Pan/zoom state for the editor viewport.
//!
//! The view transform maps between image space and screen space:
//!
//! - `to_screen(p) = p * scale + offset`
//! - `to_image(p) = (p - offset) / scale`
//!
//! All mutations are expressed as pure `state -> state` functions so the
//! engine can be tested without any rendering surface. Inputs are clamped,
//! never rejected: there is no failure mode here.

use crate::geometry::{Point, Size};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom scale.
pub const MIN_SCALE: f32 = 0.1;
/// Maximum allowed zoom scale.
pub const MAX_SCALE: f32 = 10.0;
/// Scale change per wheel delta unit. A typical wheel notch reports a delta
/// of about 100, giving roughly 10% zoom per notch.
pub const WHEEL_SENSITIVITY: f32 = 0.001;
/// Padding around the image when fitting to the container, in screen pixels.
pub const FIT_PADDING: f32 = 40.0;
/// Discrete zoom-in button factor.
pub const ZOOM_IN_FACTOR: f32 = 1.25;
/// Discrete zoom-out button factor.
pub const ZOOM_OUT_FACTOR: f32 = 0.8;

/// Viewport pan/zoom state.
///
/// Invariant: `MIN_SCALE <= scale <= MAX_SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewState {
    /// Map an image-space point to screen space.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset_x, p.y * self.scale + self.offset_y)
    }

    /// Map a screen-space point back to image space.
    pub fn to_image(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        )
    }

    /// Translate the view by a screen-space delta (drag panning).
    pub fn pan(self, dx: f32, dy: f32) -> Self {
        Self {
            offset_x: self.offset_x + dx,
            offset_y: self.offset_y + dy,
            ..self
        }
    }

    /// Zoom toward a screen-space anchor point, e.g. the wheel cursor.
    ///
    /// The offset is re-derived so that the anchor maps to the same image
    /// point before and after the zoom (no jump under the cursor).
    pub fn zoom_at(self, anchor: Point, wheel_delta: f32) -> Self {
        let target = self.scale * (1.0 + wheel_delta * WHEEL_SENSITIVITY);
        self.zoom_to(anchor, target)
    }

    /// Discrete zoom step anchored at the viewport center.
    ///
    /// Used by zoom-in/zoom-out controls with [`ZOOM_IN_FACTOR`] /
    /// [`ZOOM_OUT_FACTOR`].
    pub fn zoom_step(self, factor: f32, viewport: Size) -> Self {
        let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        self.zoom_to(center, self.scale * factor)
    }

    fn zoom_to(self, anchor: Point, target_scale: f32) -> Self {
        let new_scale = if target_scale.is_finite() {
            target_scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            self.scale
        };
        let ratio = new_scale / self.scale;
        Self {
            scale: new_scale,
            offset_x: anchor.x - (anchor.x - self.offset_x) * ratio,
            offset_y: anchor.y - (anchor.y - self.offset_y) * ratio,
        }
    }

    /// Initial view for a freshly loaded image: scaled to fit inside the
    /// container with [`FIT_PADDING`] on each side, never upscaled past
    /// 100%, and centered.
    pub fn fit_to_container(container: Size, image: Size) -> Self {
        if container.is_empty() || image.is_empty() {
            return Self::default();
        }
        let avail_w = (container.width - 2.0 * FIT_PADDING).max(1.0);
        let avail_h = (container.height - 2.0 * FIT_PADDING).max(1.0);
        let scale = (avail_w / image.width)
            .min(avail_h / image.height)
            .min(1.0)
            .clamp(MIN_SCALE, MAX_SCALE);
        Self {
            scale,
            offset_x: (container.width - image.width * scale) / 2.0,
            offset_y: (container.height - image.height * scale) / 2.0,
        }
    }
}
