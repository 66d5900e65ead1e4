//! Raster image value type shared by the editor engines.
//!
//! The editor receives already-decoded pixels from a collaborator and only
//! ever works on RGBA buffers in memory. RGBA (rather than RGB) because the
//! permissive crop mode can leave uncovered areas transparent.

use image::RgbaImage;

/// A decoded image with RGBA pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a new RasterImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create an image filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a RasterImage from an image::RgbaImage.
    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Read the RGBA value at a pixel position.
    ///
    /// Returns `None` if the position is outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Write the RGBA value at a pixel position. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&color);
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let img = RasterImage::new(10, 5, vec![0u8; 10 * 5 * 4]);
        assert_eq!(img.width, 10);
        assert_eq!(img.height, 5);
        assert_eq!(img.pixel_count(), 50);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_raster_empty() {
        let img = RasterImage::new(0, 0, vec![]);
        assert!(img.is_empty());
    }

    #[test]
    fn test_filled_color() {
        let img = RasterImage::filled(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.get(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(img.get(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(img.get(4, 0), None);
    }

    #[test]
    fn test_put_and_get_roundtrip() {
        let mut img = RasterImage::filled(8, 8, [0, 0, 0, 0]);
        img.put(3, 5, [1, 2, 3, 4]);
        assert_eq!(img.get(3, 5), Some([1, 2, 3, 4]));

        // Out-of-bounds write is silently ignored
        img.put(100, 100, [9, 9, 9, 9]);
        assert_eq!(img.get(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_rgba_image_conversion() {
        let img = RasterImage::filled(6, 3, [10, 20, 30, 40]);
        let rgba = img.to_rgba_image().unwrap();
        assert_eq!(rgba.dimensions(), (6, 3));

        let back = RasterImage::from_rgba_image(rgba);
        assert_eq!(back, img);
    }
}
