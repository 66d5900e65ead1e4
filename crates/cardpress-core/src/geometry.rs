//! Geometry primitives shared by the editor engines.
//!
//! All coordinates are in image space (origin at the source image's top-left,
//! units = source pixels) unless a function says otherwise. Screen-space
//! conversions live in the view transform, not here.

use serde::{Deserialize, Serialize};

/// A point in image or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by a delta.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if both coordinates are finite numbers.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An axis-aligned rectangle, position plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Intersection with another rectangle, or `None` if they do not overlap.
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// A rectangle of the given size centered inside `bounds`.
    pub fn centered_in(bounds: Size, size: Size) -> Rect {
        Rect::new(
            (bounds.width - size.width) / 2.0,
            (bounds.height - size.height) / 2.0,
            size.width,
            size.height,
        )
    }
}

/// Aspect ratio constraint for the crop tool.
///
/// The persisted form is a string: `"free"`, `"W:H"` for the preset ratios
/// (1:1, 3:4, 4:3, 2:3, 3:2, 16:9, 9:16), or `"custom:W:H"` for an
/// operator-entered ratio. Malformed input falls back to `Free` rather than
/// erroring, matching the editor's recover-locally policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    /// No constraint.
    #[default]
    Free,
    /// Width:height ratio, both components non-zero.
    Ratio(u32, u32),
}

impl AspectRatio {
    /// The numeric width/height ratio, or `None` when unconstrained.
    pub fn value(self) -> Option<f32> {
        match self {
            AspectRatio::Free => None,
            AspectRatio::Ratio(w, h) => Some(w as f32 / h as f32),
        }
    }

    /// Build a custom ratio; zero components fall back to `Free`.
    pub fn custom(w: u32, h: u32) -> Self {
        if w == 0 || h == 0 {
            AspectRatio::Free
        } else {
            AspectRatio::Ratio(w, h)
        }
    }

    /// Parse the persisted string form. Anything malformed is `Free`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("free") || s.is_empty() {
            return AspectRatio::Free;
        }
        let rest = s.strip_prefix("custom:").unwrap_or(s);
        let mut parts = rest.split(':');
        let w = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
        let h = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
        match (w, h, parts.next()) {
            (Some(w), Some(h), None) if w > 0 && h > 0 => AspectRatio::Ratio(w, h),
            _ => AspectRatio::Free,
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatio::Free => write!(f, "free"),
            AspectRatio::Ratio(w, h) => write!(f, "{}:{}", w, h),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AspectRatio::parse(&s))
    }
}

/// Largest size with the given width/height ratio that fits inside `bounds`.
///
/// Whichever axis is the limiting factor for the ratio determines the
/// result; the other axis is derived from it.
pub fn ratio_fit(bounds: Size, ratio: f32) -> Size {
    if bounds.is_empty() || !ratio.is_finite() || ratio <= 0.0 {
        return Size::new(0.0, 0.0);
    }
    if bounds.width / bounds.height >= ratio {
        // Height-constrained: use full height, derive width
        Size::new(bounds.height * ratio, bounds.height)
    } else {
        // Width-constrained: use full width, derive height
        Size::new(bounds.width, bounds.width / ratio)
    }
}
