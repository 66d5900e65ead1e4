//! Free-form brush strokes for content-aware repair.
//!
//! A stroke is accumulated into an image-space overlay raster while the
//! pointer is down. Segments are round-capped lines of the brush diameter;
//! the stroke's bounding box grows monotonically in image space, so it stays
//! correct if the operator pans or zooms mid-stroke.
//!
//! On completion the overlay is sampled into a strictly binary mask: any
//! painted coverage becomes opaque white on black. Antialiasing and
//! translucency are intentionally discarded so the repair service receives
//! an unambiguous mask.

use crate::geometry::{Point, Size};
use image::GrayImage;

/// Minimum brush diameter, image-space pixels.
pub const MIN_BRUSH_DIAMETER: f32 = 1.0;
/// Maximum brush diameter, image-space pixels.
pub const MAX_BRUSH_DIAMETER: f32 = 100.0;

/// Integer bounds of an extracted mask, clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A completed, binarized stroke: bounds plus a black/white bitmap of the
/// bounds region (255 = repair this pixel).
#[derive(Debug, Clone)]
pub struct MaskResult {
    pub bounds: MaskBounds,
    pub bitmap: GrayImage,
}

#[derive(Debug, Clone, Copy)]
struct StrokeBounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl StrokeBounds {
    fn union_segment(&mut self, from: Point, to: Point, radius: f32) {
        self.min_x = self.min_x.min(from.x.min(to.x) - radius);
        self.min_y = self.min_y.min(from.y.min(to.y) - radius);
        self.max_x = self.max_x.max(from.x.max(to.x) + radius);
        self.max_y = self.max_y.max(from.y.max(to.y) + radius);
    }

    fn around_segment(from: Point, to: Point, radius: f32) -> Self {
        let mut b = Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        b.union_segment(from, to, radius);
        b
    }
}

/// Accumulates one brush gesture and extracts its binary mask.
///
/// The recorder is reusable: after [`StrokeRecorder::finish`] the overlay is
/// cleared and the next [`StrokeRecorder::begin`] starts a fresh stroke.
#[derive(Debug, Clone)]
pub struct StrokeRecorder {
    width: u32,
    height: u32,
    diameter: f32,
    overlay: Vec<u8>,
    bounds: Option<StrokeBounds>,
    active: bool,
}

impl StrokeRecorder {
    pub fn new(image: Size, diameter: f32) -> Self {
        let width = image.width.max(0.0) as u32;
        let height = image.height.max(0.0) as u32;
        Self {
            width,
            height,
            diameter: clamp_diameter(diameter),
            overlay: vec![0; (width as usize) * (height as usize)],
            bounds: None,
            active: false,
        }
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    /// Change the brush size; takes effect on the next segment.
    pub fn set_diameter(&mut self, diameter: f32) {
        self.diameter = clamp_diameter(diameter);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a stroke at an image-space point. Stamps a single dot so a
    /// click without movement still paints.
    pub fn begin(&mut self, p: Point) {
        self.active = true;
        self.stamp(p, p);
    }

    /// Extend the stroke along a segment. No-op unless a stroke is active.
    pub fn extend(&mut self, from: Point, to: Point) {
        if !self.active {
            return;
        }
        self.stamp(from, to);
    }

    /// Complete the stroke (pointer-up or pointer-leave both land here) and
    /// extract the binarized mask.
    ///
    /// Returns `None` for a no-op stroke: nothing painted, or the bounding
    /// box clamps to non-positive area (e.g. a single click outside the
    /// canvas).
    pub fn finish(&mut self) -> Option<MaskResult> {
        if !self.active {
            return None;
        }
        let result = self.extract();
        self.clear();
        result
    }

    fn clear(&mut self) {
        self.overlay.fill(0);
        self.bounds = None;
        self.active = false;
    }

    fn stamp(&mut self, from: Point, to: Point) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let radius = self.diameter / 2.0;
        match &mut self.bounds {
            Some(b) => b.union_segment(from, to, radius),
            None => self.bounds = Some(StrokeBounds::around_segment(from, to, radius)),
        }

        // Rasterize only the segment's own bounding box
        let seg = StrokeBounds::around_segment(from, to, radius);
        let x0 = (seg.min_x.floor().max(0.0)) as u32;
        let y0 = (seg.min_y.floor().max(0.0)) as u32;
        let x1 = (seg.max_x.ceil().min(self.width as f32)).max(0.0) as u32;
        let y1 = (seg.max_y.ceil().min(self.height as f32)).max(0.0) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    self.overlay[(y * self.width + x) as usize] = 255;
                }
            }
        }
    }

    fn extract(&self) -> Option<MaskResult> {
        let b = self.bounds?;
        let x0 = (b.min_x.round().max(0.0) as u32).min(self.width);
        let y0 = (b.min_y.round().max(0.0) as u32).min(self.height);
        let x1 = (b.max_x.round().max(0.0) as u32).min(self.width);
        let y1 = (b.max_y.round().max(0.0) as u32).min(self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let bounds = MaskBounds {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        };
        let mut bitmap = GrayImage::new(bounds.width, bounds.height);
        for y in 0..bounds.height {
            for x in 0..bounds.width {
                let src = ((y0 + y) * self.width + x0 + x) as usize;
                let v = if self.overlay[src] != 0 { 255 } else { 0 };
                bitmap.put_pixel(x, y, image::Luma([v]));
            }
        }
        Some(MaskResult { bounds, bitmap })
    }
}

fn clamp_diameter(d: f32) -> f32 {
    if d.is_finite() {
        d.clamp(MIN_BRUSH_DIAMETER, MAX_BRUSH_DIAMETER)
    } else {
        MIN_BRUSH_DIAMETER
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * abx, a.y + t * aby))
}

/// Assemble the full-size mask the repair service expects: black everywhere
/// except the stroke pixels, which are white at the result's bounds offset.
pub fn full_mask(image: Size, result: &MaskResult) -> GrayImage {
    let mut mask = GrayImage::new(image.width.max(0.0) as u32, image.height.max(0.0) as u32);
    for (x, y, px) in result.bitmap.enumerate_pixels() {
        if px.0[0] != 0 {
            let gx = result.bounds.x + x;
            let gy = result.bounds.y + y;
            if gx < mask.width() && gy < mask.height() {
                mask.put_pixel(gx, gy, *px);
            }
        }
    }
    mask
}
