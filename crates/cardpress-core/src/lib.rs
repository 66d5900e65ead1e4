//! Cardpress Core - editor engines for the product-card image editor
//!
//! This crate provides the geometry and gesture logic behind the image
//! editor: the viewport pan/zoom transform, the constrained crop tool, the
//! repair-brush mask capture, and the insertion-region manager. Everything
//! here is pure, single-threaded state manipulation over plain data; image
//! decoding, rendering, and network calls live with collaborators.

pub mod brush;
pub mod crop;
pub mod geometry;
pub mod raster;
pub mod region;
pub mod view;

pub use brush::{full_mask, MaskBounds, MaskResult, StrokeRecorder};
pub use crop::{extract_crop, BoundsMode, CropEditor, FillMode, Handle, MIN_CROP_SIZE};
pub use geometry::{AspectRatio, Point, Rect, Size};
pub use raster::RasterImage;
pub use region::{Region, RegionSet};
pub use view::ViewState;
