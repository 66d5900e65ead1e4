//! Narrow interfaces to the editor's collaborators, plus payload assembly.
//!
//! The session never fetches bytes, talks HTTP, or touches storage itself;
//! it calls through these traits with fully assembled plain-data payloads.
//! Bitmaps cross the boundary as base64-encoded PNG, the wire format the
//! backing services use. Incoming payloads may carry a `data:image/...`
//! URL prefix; it is tolerated and stripped.

use crate::error::SessionError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cardpress_core::region::RegionSet;
use cardpress_core::{Point, RasterImage, Region};
use image::{DynamicImage, GrayImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;

use crate::config::EditorSettings;

/// Provides decoded rasters by image identifier.
pub trait ImageSource {
    fn load(&self, image_id: &str) -> Result<RasterImage, SessionError>;
}

/// Content-aware repair. The mask is black except the repair area, which is
/// white; the result is the full repaired bitmap.
pub trait InpaintService {
    fn repair(&self, image_base64: &str, mask_base64: &str) -> Result<String, SessionError>;
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
}

/// Stores the final edited bitmap. The service chooses the location; the
/// session only supplies the bitmap and the original filename stem.
pub trait SaveService {
    fn save(&self, image_base64: &str, original_filename: &str)
        -> Result<SavedFile, SessionError>;
}

/// Template persistence payload.
///
/// `points` mirrors the first region for consumers of the older
/// single-quadrilateral shape; `point_sets` is the authoritative data.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateUpdate {
    pub points: [Point; 4],
    pub point_sets: Vec<Region>,
    pub is_multi_mode: bool,
    pub crop_settings: EditorSettings,
}

impl TemplateUpdate {
    pub fn from_state(regions: &RegionSet, settings: &EditorSettings) -> Self {
        Self {
            points: regions.regions()[0].points,
            point_sets: regions.regions().to_vec(),
            is_multi_mode: regions.len() > 1,
            crop_settings: *settings,
        }
    }
}

/// Fire-and-forget template persistence; errors are surfaced but non-fatal.
pub trait TemplateStore {
    fn update(&self, template_id: &str, update: &TemplateUpdate) -> Result<(), SessionError>;
}

/// Encode a raster as base64 PNG.
pub fn encode_image_base64(image: &RasterImage) -> Result<String, SessionError> {
    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| SessionError::Encode("pixel buffer size mismatch".to_string()))?;
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| SessionError::Encode(e.to_string()))?;
    Ok(BASE64.encode(&buf))
}

/// Encode a grayscale mask as base64 PNG.
pub fn encode_mask_base64(mask: &GrayImage) -> Result<String, SessionError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(mask.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| SessionError::Encode(e.to_string()))?;
    Ok(BASE64.encode(&buf))
}

/// Decode a base64 bitmap (optionally a data URL) into a raster.
pub fn decode_image_base64(data: &str) -> Result<RasterImage, SessionError> {
    let payload = data.rsplit(',').next().unwrap_or(data);
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| SessionError::Decode(e.to_string()))?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| SessionError::Decode(e.to_string()))?;
    Ok(RasterImage::from_rgba_image(decoded.to_rgba8()))
}
