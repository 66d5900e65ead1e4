//! Crop tool: a drag state machine producing a constrained crop rectangle.
//!
//! The engine owns a [`Rect`] in image space and mutates it through
//! pointer-down/move/up transitions. Three invariants hold after every
//! mutation:
//!
//! - width and height are at least [`MIN_CROP_SIZE`]
//! - if an aspect ratio is active, width/height matches it
//! - the rectangle satisfies the active [`BoundsMode`]
//!
//! There are no error states: all geometry is clamped.

mod extract;

pub use extract::extract_crop;

use crate::geometry::{ratio_fit, AspectRatio, Point, Rect, Size};
use crate::view::ViewState;
use serde::{Deserialize, Serialize};

/// Minimum crop rectangle edge length, in image pixels.
pub const MIN_CROP_SIZE: f32 = 20.0;

/// Screen-space hit radius for the resize handles.
pub const HANDLE_HIT_RADIUS: f32 = 10.0;

/// One of the eight resize handles on the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    /// All handles in rendering order.
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::North,
        Handle::NorthEast,
        Handle::East,
        Handle::SouthEast,
        Handle::South,
        Handle::SouthWest,
        Handle::West,
    ];

    fn affects_left(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::West | Handle::SouthWest)
    }

    fn affects_right(self) -> bool {
        matches!(self, Handle::NorthEast | Handle::East | Handle::SouthEast)
    }

    fn affects_top(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::North | Handle::NorthEast)
    }

    fn affects_bottom(self) -> bool {
        matches!(self, Handle::SouthWest | Handle::South | Handle::SouthEast)
    }

    /// Vertical-only handles derive width from height under an aspect
    /// ratio; every other handle derives height from width.
    fn is_vertical_only(self) -> bool {
        matches!(self, Handle::North | Handle::South)
    }

    fn flip_horizontal(self) -> Self {
        match self {
            Handle::NorthWest => Handle::NorthEast,
            Handle::NorthEast => Handle::NorthWest,
            Handle::West => Handle::East,
            Handle::East => Handle::West,
            Handle::SouthWest => Handle::SouthEast,
            Handle::SouthEast => Handle::SouthWest,
            other => other,
        }
    }

    fn flip_vertical(self) -> Self {
        match self {
            Handle::NorthWest => Handle::SouthWest,
            Handle::SouthWest => Handle::NorthWest,
            Handle::North => Handle::South,
            Handle::South => Handle::North,
            Handle::NorthEast => Handle::SouthEast,
            Handle::SouthEast => Handle::NorthEast,
            other => other,
        }
    }

    /// The handle's position on a rectangle, in the rectangle's space.
    pub fn position(self, rect: Rect) -> Point {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            Handle::NorthWest => Point::new(rect.x, rect.y),
            Handle::North => Point::new(cx, rect.y),
            Handle::NorthEast => Point::new(rect.right(), rect.y),
            Handle::East => Point::new(rect.right(), cy),
            Handle::SouthEast => Point::new(rect.right(), rect.bottom()),
            Handle::South => Point::new(cx, rect.bottom()),
            Handle::SouthWest => Point::new(rect.x, rect.bottom()),
            Handle::West => Point::new(rect.x, cy),
        }
    }
}

/// Whether the crop rectangle may leave the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsMode {
    /// The rectangle is kept fully inside the image.
    #[default]
    Strict,
    /// The rectangle may extend past the image as long as it overlaps it
    /// by at least [`MIN_CROP_SIZE`] on each axis.
    Permissive,
}

/// Fill for the uncovered area when a permissive crop extends past the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    Transparent,
    Solid([u8; 4]),
}

impl Default for FillMode {
    fn default() -> Self {
        FillMode::Transparent
    }
}

/// What a pointer-down on the crop overlay hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropTarget {
    Body,
    Handle(Handle),
}

/// Drag gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Moving,
    Resizing(Handle),
}

/// The crop constraint engine.
///
/// Created when the crop tool activates; dropped on commit or cancel.
#[derive(Debug, Clone)]
pub struct CropEditor {
    area: Rect,
    ratio: AspectRatio,
    bounds_mode: BoundsMode,
    image: Size,
    state: DragState,
    last: Point,
}

/// Initial crop placement: ratio-fit to 80% of the image, centered.
pub fn initial_crop(image: Size, ratio: AspectRatio) -> Rect {
    let target = Size::new(image.width * 0.8, image.height * 0.8);
    let size = match ratio.value() {
        Some(r) => ratio_fit(target, r),
        None => target,
    };
    let size = Size::new(size.width.max(MIN_CROP_SIZE), size.height.max(MIN_CROP_SIZE));
    Rect::centered_in(image, size)
}

impl CropEditor {
    pub fn new(image: Size, ratio: AspectRatio, bounds_mode: BoundsMode) -> Self {
        Self {
            area: initial_crop(image, ratio),
            ratio,
            bounds_mode,
            image,
            state: DragState::Idle,
            last: Point::default(),
        }
    }

    /// The current crop rectangle, in image space.
    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn bounds_mode(&self) -> BoundsMode {
        self.bounds_mode
    }

    /// True while a move or resize gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Changing the ratio re-initializes the rectangle, like tool activation.
    pub fn set_ratio(&mut self, ratio: AspectRatio) {
        self.ratio = ratio;
        self.area = initial_crop(self.image, ratio);
        self.state = DragState::Idle;
    }

    pub fn set_bounds_mode(&mut self, mode: BoundsMode) {
        self.bounds_mode = mode;
        self.area = self.constrain(self.area);
    }

    /// Test what a screen-space point would grab. Handles win over the body.
    pub fn hit_test(&self, screen: Point, view: &ViewState) -> Option<CropTarget> {
        for handle in Handle::ALL {
            let pos = view.to_screen(handle.position(self.area));
            if pos.distance(screen) <= HANDLE_HIT_RADIUS {
                return Some(CropTarget::Handle(handle));
            }
        }
        let image_point = view.to_image(screen);
        if self.area.contains(image_point) {
            return Some(CropTarget::Body);
        }
        None
    }

    /// Begin a gesture. Returns true if the pointer grabbed the crop.
    pub fn pointer_down(&mut self, screen: Point, view: &ViewState) -> bool {
        match self.hit_test(screen, view) {
            Some(CropTarget::Body) => self.state = DragState::Moving,
            Some(CropTarget::Handle(h)) => self.state = DragState::Resizing(h),
            None => return false,
        }
        self.last = view.to_image(screen);
        true
    }

    /// Continue the active gesture, if any.
    pub fn pointer_move(&mut self, screen: Point, view: &ViewState) {
        let p = view.to_image(screen);
        if !p.is_finite() {
            return;
        }
        match self.state {
            DragState::Idle => {}
            DragState::Moving => {
                let dx = p.x - self.last.x;
                let dy = p.y - self.last.y;
                self.area = self.clamp_position(Rect::new(
                    self.area.x + dx,
                    self.area.y + dy,
                    self.area.width,
                    self.area.height,
                ));
            }
            DragState::Resizing(handle) => {
                let next = self.resize_toward(handle, p);
                self.state = DragState::Resizing(next);
            }
        }
        self.last = p;
    }

    /// End the gesture.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// Resize toward the pointer. Returns the (possibly flipped) handle.
    fn resize_toward(&mut self, handle: Handle, p: Point) -> Handle {
        let r = self.area;
        let right = r.right();
        let bottom = r.bottom();

        let mut x = r.x;
        let mut y = r.y;
        let mut w = r.width;
        let mut h = r.height;
        let mut handle = handle;

        if handle.affects_left() {
            x = p.x;
            w = right - p.x;
        }
        if handle.affects_right() {
            w = p.x - r.x;
        }
        if handle.affects_top() {
            y = p.y;
            h = bottom - p.y;
        }
        if handle.affects_bottom() {
            h = p.y - r.y;
        }

        // Dragging past the opposite edge flips the rectangle instead of
        // inverting it: relocate the origin and carry on from the mirrored
        // handle. The anchored edge flips with it.
        let mut anchor_left = r.x;
        let mut anchor_right = right;
        let mut anchor_top = r.y;
        let mut anchor_bottom = bottom;
        if w < 0.0 {
            x += w;
            w = -w;
            handle = handle.flip_horizontal();
            std::mem::swap(&mut anchor_left, &mut anchor_right);
        }
        if h < 0.0 {
            y += h;
            h = -h;
            handle = handle.flip_vertical();
            std::mem::swap(&mut anchor_top, &mut anchor_bottom);
        }

        if let Some(ratio) = self.ratio.value() {
            if handle.is_vertical_only() {
                w = h * ratio;
            } else {
                h = w / ratio;
            }
            if w < MIN_CROP_SIZE || h < MIN_CROP_SIZE {
                if ratio >= 1.0 {
                    h = MIN_CROP_SIZE;
                    w = MIN_CROP_SIZE * ratio;
                } else {
                    w = MIN_CROP_SIZE;
                    h = MIN_CROP_SIZE / ratio;
                }
            }
        } else {
            w = w.max(MIN_CROP_SIZE);
            h = h.max(MIN_CROP_SIZE);
        }

        // Re-pin the anchored edges after the size adjustments above.
        if handle.affects_left() {
            x = anchor_right - w;
        } else if handle.affects_right() {
            x = anchor_left;
        }
        if handle.affects_top() {
            y = anchor_bottom - h;
        } else if handle.affects_bottom() {
            y = anchor_top;
        }

        self.area = self.constrain(Rect::new(x, y, w, h));
        handle
    }

    /// Apply the full bounds discipline: size first, then position.
    fn constrain(&self, rect: Rect) -> Rect {
        let rect = match self.bounds_mode {
            BoundsMode::Strict => self.clamp_size_strict(rect),
            BoundsMode::Permissive => rect,
        };
        self.clamp_position(rect)
    }

    fn clamp_size_strict(&self, rect: Rect) -> Rect {
        let mut w = rect.width;
        let mut h = rect.height;
        if let Some(ratio) = self.ratio.value() {
            if w > self.image.width || h > self.image.height {
                // Shrink proportionally so the ratio survives the clamp
                let s = (self.image.width / w).min(self.image.height / h);
                w *= s;
                h = w / ratio;
            }
        } else {
            w = w.min(self.image.width);
            h = h.min(self.image.height);
        }
        Rect::new(rect.x, rect.y, w, h)
    }

    /// Clamp the origin per bounds mode. X is clamped before Y; the axes are
    /// independent, so the order only matters for documentation.
    fn clamp_position(&self, rect: Rect) -> Rect {
        let (x, y) = match self.bounds_mode {
            BoundsMode::Strict => (
                rect.x.clamp(0.0, (self.image.width - rect.width).max(0.0)),
                rect.y.clamp(0.0, (self.image.height - rect.height).max(0.0)),
            ),
            BoundsMode::Permissive => {
                // Images smaller than MIN_CROP_SIZE would put the upper
                // bound below the lower one; pin the range instead
                let lo_x = MIN_CROP_SIZE - rect.width;
                let hi_x = (self.image.width - MIN_CROP_SIZE).max(lo_x);
                let lo_y = MIN_CROP_SIZE - rect.height;
                let hi_y = (self.image.height - MIN_CROP_SIZE).max(lo_y);
                (rect.x.clamp(lo_x, hi_x), rect.y.clamp(lo_y, hi_y))
            }
        };
        Rect::new(x, y, rect.width, rect.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Size {
        Size::new(1000.0, 800.0)
    }

    fn drag(editor: &mut CropEditor, from: Point, to: Point) {
        let view = ViewState::default();
        assert!(editor.pointer_down(from, &view));
        editor.pointer_move(to, &view);
        editor.pointer_up();
    }

    #[test]
    fn test_initial_crop_free_ratio() {
        let area = initial_crop(image(), AspectRatio::Free);
        assert_eq!(area, Rect::new(100.0, 80.0, 800.0, 640.0));
    }

    #[test]
    fn test_initial_crop_square_is_height_constrained() {
        // 80% box is 800x640; a 1:1 fit inside it is 640x640, centered.
        let area = initial_crop(image(), AspectRatio::Ratio(1, 1));
        assert_eq!(area, Rect::new(180.0, 80.0, 640.0, 640.0));
        assert!((area.width / area.height - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_move_translates_and_clamps_strict() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let center = editor.area().center();
        drag(&mut editor, center, center.offset(5000.0, 5000.0));
        let area = editor.area();
        // Pushed to the bottom-right corner but still inside
        assert_eq!(area.x, 1000.0 - area.width);
        assert_eq!(area.y, 800.0 - area.height);
    }

    #[test]
    fn test_move_permissive_keeps_min_overlap() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Permissive);
        let center = editor.area().center();
        drag(&mut editor, center, center.offset(-5000.0, -5000.0));
        let area = editor.area();
        // Far off-canvas but still MIN_CROP_SIZE of overlap remains
        assert_eq!(area.right(), MIN_CROP_SIZE);
        assert_eq!(area.bottom(), MIN_CROP_SIZE);
    }

    #[test]
    fn test_permissive_clamp_survives_tiny_image() {
        // Image smaller than the minimum crop size: the rectangle cannot
        // satisfy the overlap rule, so the clamp pins it instead of panicking
        let mut editor =
            CropEditor::new(Size::new(10.0, 10.0), AspectRatio::Free, BoundsMode::Permissive);
        let corner = Point::new(editor.area().right(), editor.area().bottom());
        drag(&mut editor, corner, corner.offset(1.0, 1.0));

        let center = editor.area().center();
        drag(&mut editor, center, center.offset(-30.0, 40.0));

        let area = editor.area();
        assert!(area.width >= MIN_CROP_SIZE);
        assert!(area.height >= MIN_CROP_SIZE);
        assert!(area.x.is_finite() && area.y.is_finite());
    }

    #[test]
    fn test_resize_se_grows_square() {
        let mut editor = CropEditor::new(image(), AspectRatio::Ratio(1, 1), BoundsMode::Strict);
        let corner = Point::new(editor.area().right(), editor.area().bottom());
        drag(&mut editor, corner, corner.offset(50.0, 50.0));
        let area = editor.area();
        assert!((area.width - 690.0).abs() < 1e-3);
        assert!((area.height - 690.0).abs() < 1e-3);
        assert!((area.width / area.height - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_never_below_minimum() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let corner = Point::new(editor.area().right(), editor.area().bottom());
        // Collapse toward the opposite corner and beyond
        let target = Point::new(editor.area().x + 1.0, editor.area().y + 1.0);
        drag(&mut editor, corner, target);
        let area = editor.area();
        assert!(area.width >= MIN_CROP_SIZE);
        assert!(area.height >= MIN_CROP_SIZE);
    }

    #[test]
    fn test_resize_flips_instead_of_inverting() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let start = editor.area();
        let corner = Point::new(start.right(), start.bottom());
        // Drag the SE corner far past the NW corner
        drag(&mut editor, corner, Point::new(start.x - 200.0, start.y - 200.0));
        let area = editor.area();
        assert!(area.width > 0.0);
        assert!(area.height > 0.0);
        assert!(area.x >= 0.0 && area.y >= 0.0);
    }

    #[test]
    fn test_vertical_handle_derives_width_from_height() {
        let mut editor = CropEditor::new(image(), AspectRatio::Ratio(2, 1), BoundsMode::Strict);
        let start = editor.area();
        let south = Handle::South.position(start);
        drag(&mut editor, south, south.offset(0.0, 30.0));
        let area = editor.area();
        assert!((area.width / area.height - 2.0).abs() < 1e-3);
        assert!(area.height > start.height);
    }

    #[test]
    fn test_min_size_rederives_both_axes_with_ratio() {
        let mut editor = CropEditor::new(image(), AspectRatio::Ratio(3, 1), BoundsMode::Strict);
        let start = editor.area();
        let corner = Point::new(start.right(), start.bottom());
        drag(&mut editor, corner, Point::new(start.x + 1.0, start.y + 1.0));
        let area = editor.area();
        // Wide ratio: height pinned at minimum, width derived
        assert!((area.height - MIN_CROP_SIZE).abs() < 1e-3);
        assert!((area.width - MIN_CROP_SIZE * 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_strict_size_clamp_preserves_ratio() {
        let mut editor =
            CropEditor::new(Size::new(400.0, 400.0), AspectRatio::Ratio(1, 1), BoundsMode::Strict);
        let corner = Point::new(editor.area().right(), editor.area().bottom());
        drag(&mut editor, corner, corner.offset(2000.0, 2000.0));
        let area = editor.area();
        assert!(area.width <= 400.0 + 1e-3);
        assert!(area.height <= 400.0 + 1e-3);
        assert!((area.width / area.height - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_ratio_reinitializes() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let center = editor.area().center();
        drag(&mut editor, center, center.offset(100.0, 50.0));
        editor.set_ratio(AspectRatio::Ratio(1, 1));
        assert_eq!(editor.area(), initial_crop(image(), AspectRatio::Ratio(1, 1)));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_pointer_down_outside_is_ignored() {
        let mut editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let view = ViewState::default();
        assert!(!editor.pointer_down(Point::new(-500.0, -500.0), &view));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_hit_test_prefers_handles_over_body() {
        let editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let view = ViewState::default();
        let corner = editor.area();
        let hit = editor.hit_test(Point::new(corner.x, corner.y), &view);
        assert_eq!(hit, Some(CropTarget::Handle(Handle::NorthWest)));

        let hit = editor.hit_test(view.to_screen(corner.center()), &view);
        assert_eq!(hit, Some(CropTarget::Body));
    }

    #[test]
    fn test_hit_test_respects_view_scale() {
        let editor = CropEditor::new(image(), AspectRatio::Free, BoundsMode::Strict);
        let view = ViewState {
            scale: 2.0,
            offset_x: 100.0,
            offset_y: 100.0,
        };
        let nw = view.to_screen(Point::new(editor.area().x, editor.area().y));
        let hit = editor.hit_test(nw, &view);
        assert_eq!(hit, Some(CropTarget::Handle(Handle::NorthWest)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ratio_strategy() -> impl Strategy<Value = AspectRatio> {
        prop_oneof![
            Just(AspectRatio::Free),
            Just(AspectRatio::Ratio(1, 1)),
            Just(AspectRatio::Ratio(3, 4)),
            Just(AspectRatio::Ratio(4, 3)),
            Just(AspectRatio::Ratio(16, 9)),
            Just(AspectRatio::Ratio(9, 16)),
        ]
    }

    fn gesture_strategy() -> impl Strategy<Value = Vec<(f32, f32)>> {
        prop::collection::vec((-1500.0f32..=1500.0, -1500.0f32..=1500.0), 1..20)
    }

    proptest! {
        /// Property: after any drag sequence the crop keeps its minimum
        /// size, and with a ratio active the ratio holds.
        #[test]
        fn prop_crop_invariants_hold_after_drags(
            ratio in ratio_strategy(),
            strict in proptest::bool::ANY,
            handle_idx in 0usize..8,
            moves in gesture_strategy(),
        ) {
            let bounds = if strict { BoundsMode::Strict } else { BoundsMode::Permissive };
            let mut editor = CropEditor::new(Size::new(1000.0, 800.0), ratio, bounds);
            let view = ViewState::default();

            let start = Handle::ALL[handle_idx].position(editor.area());
            editor.pointer_down(start, &view);
            for (x, y) in moves {
                editor.pointer_move(Point::new(x, y), &view);
            }
            editor.pointer_up();

            let area = editor.area();
            prop_assert!(area.width >= MIN_CROP_SIZE - 1e-3);
            prop_assert!(area.height >= MIN_CROP_SIZE - 1e-3);

            if let Some(r) = ratio.value() {
                prop_assert!((area.width / area.height - r).abs() <= 1e-3 * r.max(1.0));
            }

            match bounds {
                BoundsMode::Strict => {
                    prop_assert!(area.x >= -1e-3);
                    prop_assert!(area.y >= -1e-3);
                    prop_assert!(area.right() <= 1000.0 + 1e-2);
                    prop_assert!(area.bottom() <= 800.0 + 1e-2);
                }
                BoundsMode::Permissive => {
                    // At least MIN_CROP_SIZE of overlap on each axis
                    let overlap_x = area.right().min(1000.0) - area.x.max(0.0);
                    let overlap_y = area.bottom().min(800.0) - area.y.max(0.0);
                    prop_assert!(overlap_x >= MIN_CROP_SIZE - 1e-2);
                    prop_assert!(overlap_y >= MIN_CROP_SIZE - 1e-2);
                }
            }
        }

        /// Property: moving the body never changes the crop size.
        #[test]
        fn prop_move_preserves_size(
            ratio in ratio_strategy(),
            moves in gesture_strategy(),
        ) {
            let mut editor =
                CropEditor::new(Size::new(1000.0, 800.0), ratio, BoundsMode::Strict);
            let view = ViewState::default();
            let size = editor.area().size();

            editor.pointer_down(editor.area().center(), &view);
            for (x, y) in moves {
                editor.pointer_move(Point::new(x, y), &view);
            }
            editor.pointer_up();

            prop_assert!((editor.area().width - size.width).abs() < 1e-3);
            prop_assert!((editor.area().height - size.height).abs() < 1e-3);
        }
    }
}
