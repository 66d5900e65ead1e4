//! Insertion regions: up to ten independently edited quadrilaterals on a
//! template image.
//!
//! Each region is four ordered corner points (top-left, top-right,
//! bottom-right, bottom-left) in image space, plus a stable index. Exactly
//! one region is active at any time; drag and keyboard edits only ever touch
//! the active region.

pub mod persist;

use crate::geometry::Point;
use crate::view::ViewState;
use serde::{Deserialize, Serialize};

/// Maximum number of regions in a set.
pub const MAX_REGIONS: usize = 10;

/// Image-space offset between stacked default regions, so they appear
/// diagonally staggered instead of on top of each other.
pub const STAGGER_OFFSET: f32 = 50.0;

/// Screen-space corner handle radius for the active region.
pub const ACTIVE_HANDLE_RADIUS: f32 = 7.0;
/// Screen-space corner handle radius for inactive regions.
pub const INACTIVE_HANDLE_RADIUS: f32 = 5.0;
/// Extra hit-test slack around a handle, screen pixels.
pub const HANDLE_HIT_SLACK: f32 = 8.0;

/// Fixed region color palette. Colors are looked up by `index % len`, so
/// they stay stable when `remove` reassigns indices.
pub const PALETTE: [[u8; 3]; 10] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [67, 99, 216],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [188, 246, 12],
    [250, 190, 212],
];

/// Corner order within a region's point array.
pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_RIGHT: usize = 2;
pub const BOTTOM_LEFT: usize = 3;

/// One insertion quadrilateral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub index: u8,
    /// Corners ordered TL, TR, BR, BL.
    pub points: [Point; 4],
}

impl Region {
    /// Canonical default: an axis-aligned square staggered by
    /// `index * STAGGER_OFFSET` from the base square at (100, 100).
    pub fn default_at(index: u8) -> Self {
        let d = index as f32 * STAGGER_OFFSET;
        Self {
            index,
            points: [
                Point::new(100.0 + d, 100.0 + d),
                Point::new(400.0 + d, 100.0 + d),
                Point::new(400.0 + d, 400.0 + d),
                Point::new(100.0 + d, 400.0 + d),
            ],
        }
    }

    /// A copy of this region's points translated by a delta.
    pub fn offset_points(&self, dx: f32, dy: f32) -> [Point; 4] {
        let mut points = self.points;
        for p in &mut points {
            *p = p.offset(dx, dy);
        }
        points
    }

    /// True if opposite edges of the quadrilateral cross each other.
    ///
    /// Degenerate persisted data can produce an "hourglass" ordering; the
    /// warp step cannot use such a region, so validation flags it.
    pub fn is_self_intersecting(&self) -> bool {
        fn ccw(a: Point, b: Point, c: Point) -> bool {
            (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
        }
        fn intersects(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
            ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
        }
        let [a, b, c, d] = self.points;
        // TL-TR vs BR-BL, and TR-BR vs BL-TL
        intersects(a, b, c, d) || intersects(b, c, d, a)
    }
}

/// A corner handle hit: which region and which of its four corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHit {
    pub region: u8,
    pub corner: usize,
}

/// Render directives for one region. Inactive regions draw dimmer and with
/// smaller handles, signalling editability priority without blocking
/// interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStyle {
    pub color: [u8; 3],
    pub opacity: f32,
    pub handle_radius: f32,
    pub is_active: bool,
}

/// An ordered set of 1..=10 regions with exactly one active.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet {
    regions: Vec<Region>,
    active: u8,
}

impl Default for RegionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionSet {
    /// A fresh set with one default region, active.
    pub fn new() -> Self {
        Self {
            regions: vec![Region::default_at(0)],
            active: 0,
        }
    }

    /// Build from already-validated regions (the deserialization boundary).
    /// The first region becomes active.
    pub(crate) fn from_regions(regions: Vec<Region>) -> Self {
        debug_assert!(!regions.is_empty() && regions.len() <= MAX_REGIONS);
        Self {
            regions,
            active: 0,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        false // invariant: at least one region always exists
    }

    pub fn active_index(&self) -> u8 {
        self.active
    }

    pub fn active_region(&self) -> &Region {
        // invariant: active always names an existing region
        self.regions
            .iter()
            .find(|r| r.index == self.active)
            .unwrap_or(&self.regions[0])
    }

    /// Make a region active. Returns false if no region has that index.
    pub fn select(&mut self, index: u8) -> bool {
        if self.regions.iter().any(|r| r.index == index) {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Append a new region, staggered from the last one, and make it active.
    ///
    /// No-op returning `None` when the set is already at [`MAX_REGIONS`].
    pub fn add(&mut self) -> Option<u8> {
        if self.regions.len() >= MAX_REGIONS {
            return None;
        }
        let index = self.smallest_unused_index();
        let points = self
            .regions
            .last()
            .map(|last| last.offset_points(STAGGER_OFFSET, STAGGER_OFFSET))
            .unwrap_or(Region::default_at(0).points);
        self.regions.push(Region { index, points });
        self.active = index;
        Some(index)
    }

    /// Delete a region and reindex the survivors to a contiguous 0..n-1
    /// range in their original relative order.
    ///
    /// No-op returning false when only one region remains or the index does
    /// not exist. If the removed region was active, the first remaining
    /// region becomes active; otherwise the active index shifts down with
    /// the reindexing.
    pub fn remove(&mut self, index: u8) -> bool {
        if self.regions.len() <= 1 {
            return false;
        }
        let Some(pos) = self.regions.iter().position(|r| r.index == index) else {
            return false;
        };
        let was_active = self.active == index;
        self.regions.remove(pos);
        for (i, region) in self.regions.iter_mut().enumerate() {
            region.index = i as u8;
        }
        if was_active {
            self.active = self.regions[0].index;
        } else if self.active > index {
            self.active -= 1;
        }
        true
    }

    /// Find the corner handle under a screen point.
    ///
    /// The active region's handles are tested first with their larger
    /// radius, so overlapping handles resolve in favor of the region being
    /// edited; only then are other regions' corners considered.
    pub fn hit_test(&self, screen: Point, view: &ViewState) -> Option<RegionHit> {
        let active = self.active_region();
        if let Some(corner) = hit_corner(active, screen, view, ACTIVE_HANDLE_RADIUS) {
            return Some(RegionHit {
                region: active.index,
                corner,
            });
        }
        for region in &self.regions {
            if region.index == self.active {
                continue;
            }
            if let Some(corner) = hit_corner(region, screen, view, INACTIVE_HANDLE_RADIUS) {
                return Some(RegionHit {
                    region: region.index,
                    corner,
                });
            }
        }
        None
    }

    /// Move one corner of the active region to an image-space position.
    /// Only the active region is ever mutated.
    pub fn drag_active_corner(&mut self, corner: usize, to: Point) {
        if corner >= 4 || !to.is_finite() {
            return;
        }
        let active = self.active;
        if let Some(region) = self.regions.iter_mut().find(|r| r.index == active) {
            region.points[corner] = to;
        }
    }

    /// Keyboard nudge: translate one corner of the active region by a delta.
    pub fn nudge_active_corner(&mut self, corner: usize, dx: f32, dy: f32) {
        if corner >= 4 {
            return;
        }
        let current = self.active_region().points[corner];
        self.drag_active_corner(corner, current.offset(dx, dy));
    }

    /// Deterministic color for a region index.
    pub fn color(index: u8) -> [u8; 3] {
        PALETTE[index as usize % PALETTE.len()]
    }

    /// Render directives for a region.
    pub fn style(&self, index: u8) -> RegionStyle {
        let is_active = index == self.active;
        RegionStyle {
            color: Self::color(index),
            opacity: if is_active { 1.0 } else { 0.5 },
            handle_radius: if is_active {
                ACTIVE_HANDLE_RADIUS
            } else {
                INACTIVE_HANDLE_RADIUS
            },
            is_active,
        }
    }

    fn smallest_unused_index(&self) -> u8 {
        (0..MAX_REGIONS as u8)
            .find(|i| !self.regions.iter().any(|r| r.index == *i))
            .unwrap_or(self.regions.len() as u8)
    }
}

fn hit_corner(region: &Region, screen: Point, view: &ViewState, radius: f32) -> Option<usize> {
    region.points.iter().position(|p| {
        view.to_screen(*p).distance(screen) <= radius + HANDLE_HIT_SLACK
    })
}
