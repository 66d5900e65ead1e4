//! Crop commit: copy the sub-raster under the crop rectangle.
//!
//! In permissive bounds mode the rectangle may extend past the source
//! image; the uncovered area is pre-filled per [`FillMode`] before the
//! in-bounds portion is copied over it.

use super::FillMode;
use crate::geometry::Rect;
use crate::raster::RasterImage;

/// Extract the crop rectangle from an image.
///
/// The rectangle is rounded to whole pixels; the output is at least 1x1.
/// Pixels outside the source image are filled per `fill`.
pub fn extract_crop(image: &RasterImage, area: Rect, fill: FillMode) -> RasterImage {
    let out_w = area.width.round().max(1.0) as i64;
    let out_h = area.height.round().max(1.0) as i64;
    let x0 = area.x.round() as i64;
    let y0 = area.y.round() as i64;

    let fill_color = match fill {
        FillMode::Transparent => [0, 0, 0, 0],
        FillMode::Solid(c) => c,
    };
    let mut output = RasterImage::filled(out_w as u32, out_h as u32, fill_color);

    let src_w = image.width as i64;
    let src_h = image.height as i64;

    // Horizontal overlap between the crop and the source, in source coords
    let copy_x0 = x0.max(0);
    let copy_x1 = (x0 + out_w).min(src_w);
    if copy_x1 <= copy_x0 {
        return output;
    }
    let row_bytes = ((copy_x1 - copy_x0) * 4) as usize;

    for out_y in 0..out_h {
        let src_y = y0 + out_y;
        if src_y < 0 || src_y >= src_h {
            continue;
        }
        let src_start = ((src_y * src_w + copy_x0) * 4) as usize;
        let dst_start = ((out_y * out_w + (copy_x0 - x0)) * 4) as usize;
        output.pixels[dst_start..dst_start + row_bytes]
            .copy_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    output
}
