//! The editor session: one open template, one working image.
//!
//! An `EditorSession` owns the engine state exclusively for its lifetime
//! and routes pointer/wheel/keyboard events to whichever engine the current
//! tool selects. The view transform is always active; crop, repair brush,
//! and region editing are mutually exclusive tools on top of it.
//!
//! The session is single-threaded and synchronous. The only asynchronous
//! collaborations, repair and persistence, are modeled as plain data
//! handed to the host: a repair becomes an [`InpaintRequest`] the host
//! sends and answers via [`EditorSession::apply_inpaint_result`] or
//! [`EditorSession::fail_inpaint`], and persistence deadlines are driven
//! by [`EditorSession::flush_due`].

use crate::config::EditorSettings;
use crate::error::SessionError;
use crate::services::{
    decode_image_base64, encode_image_base64, encode_mask_base64, ImageSource, InpaintService,
    SaveService, SavedFile, TemplateStore, TemplateUpdate,
};
use crate::sync::SyncScheduler;
use cardpress_core::brush::{full_mask, StrokeRecorder};
use cardpress_core::crop::{extract_crop, BoundsMode, CropEditor, FillMode};
use cardpress_core::region::persist::{deserialize_or_default, RawRegionData};
use cardpress_core::region::RegionSet;
use cardpress_core::view::{ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use cardpress_core::{AspectRatio, Point, RasterImage, Rect, Size, ViewState};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which engine pointer events are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Pan,
    Crop,
    Repair,
    Regions,
}

/// What the active pointer gesture is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerCapture {
    View,
    Crop,
    Stroke,
    RegionCorner(usize),
}

/// An assembled repair request for the host to send. While one is
/// outstanding the session rejects new completed strokes.
#[derive(Debug, Clone)]
pub struct InpaintRequest {
    pub image_base64: String,
    pub mask_base64: String,
}

pub struct EditorSession {
    template_id: String,
    image: RasterImage,
    settings: EditorSettings,
    viewport: Size,
    view: ViewState,
    tool: ToolMode,
    crop: Option<CropEditor>,
    stroke: StrokeRecorder,
    regions: RegionSet,
    capture: Option<PointerCapture>,
    last_screen: Point,
    scheduler: SyncScheduler,
    store: Box<dyn TemplateStore>,
    inpaint_in_flight: bool,
}

impl EditorSession {
    /// Open an editor session for a template.
    ///
    /// Loads the working image through the image source, fits the view to
    /// the viewport, and restores persisted regions (defaulting on any
    /// malformed data).
    pub fn open(
        template_id: impl Into<String>,
        image_id: &str,
        viewport: Size,
        settings: EditorSettings,
        regions_raw: Option<RawRegionData>,
        source: &dyn ImageSource,
        store: Box<dyn TemplateStore>,
    ) -> Result<Self, SessionError> {
        let template_id = template_id.into();
        let image = source.load(image_id)?;
        let settings = settings.sanitized();
        let image_size = Size::new(image.width as f32, image.height as f32);
        let regions = regions_raw.map(deserialize_or_default).unwrap_or_default();
        info!(
            template = %template_id,
            width = image.width,
            height = image.height,
            regions = regions.len(),
            "editor session opened"
        );
        Ok(Self {
            template_id,
            view: ViewState::fit_to_container(viewport, image_size),
            stroke: StrokeRecorder::new(image_size, settings.brush_diameter),
            image,
            settings,
            viewport,
            tool: ToolMode::Pan,
            crop: None,
            regions,
            capture: None,
            last_screen: Point::default(),
            scheduler: SyncScheduler::new(),
            store,
            inpaint_in_flight: false,
        })
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn crop_area(&self) -> Option<Rect> {
        self.crop.as_ref().map(|c| c.area())
    }

    pub fn is_inpaint_in_flight(&self) -> bool {
        self.inpaint_in_flight
    }

    fn image_size(&self) -> Size {
        Size::new(self.image.width as f32, self.image.height as f32)
    }

    // ------------------------------------------------------------------
    // Tools and settings
    // ------------------------------------------------------------------

    /// Switch tools. Leaving the crop tool discards any uncommitted
    /// rectangle; entering it creates a fresh centered one.
    pub fn set_tool(&mut self, tool: ToolMode) {
        if self.tool == tool {
            return;
        }
        debug!(?tool, "tool changed");
        if self.tool == ToolMode::Crop {
            self.crop = None;
        }
        self.capture = None;
        if tool == ToolMode::Crop {
            self.crop = Some(CropEditor::new(
                self.image_size(),
                self.settings.aspect_ratio,
                self.settings.bounds_mode,
            ));
        }
        self.tool = tool;
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.settings.aspect_ratio = ratio;
        if let Some(crop) = self.crop.as_mut() {
            crop.set_ratio(ratio);
        }
    }

    pub fn set_bounds_mode(&mut self, mode: BoundsMode) {
        self.settings.bounds_mode = mode;
        if let Some(crop) = self.crop.as_mut() {
            crop.set_bounds_mode(mode);
        }
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.settings.fill_mode = mode;
    }

    pub fn set_brush_diameter(&mut self, diameter: f32) {
        self.stroke.set_diameter(diameter);
        self.settings.brush_diameter = self.stroke.diameter();
    }

    // ------------------------------------------------------------------
    // View events
    // ------------------------------------------------------------------

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn wheel_zoom(&mut self, anchor: Point, delta: f32) {
        self.view = self.view.zoom_at(anchor, delta);
    }

    pub fn zoom_in(&mut self) {
        self.view = self.view.zoom_step(ZOOM_IN_FACTOR, self.viewport);
    }

    pub fn zoom_out(&mut self) {
        self.view = self.view.zoom_step(ZOOM_OUT_FACTOR, self.viewport);
    }

    // ------------------------------------------------------------------
    // Pointer routing
    // ------------------------------------------------------------------

    /// Begin a gesture at a screen-space point.
    pub fn pointer_down(&mut self, screen: Point) {
        self.last_screen = screen;
        self.capture = match self.tool {
            ToolMode::Pan => Some(PointerCapture::View),
            ToolMode::Crop => {
                let grabbed = self
                    .crop
                    .as_mut()
                    .map(|c| c.pointer_down(screen, &self.view))
                    .unwrap_or(false);
                if grabbed {
                    Some(PointerCapture::Crop)
                } else {
                    Some(PointerCapture::View)
                }
            }
            ToolMode::Repair => {
                self.stroke.begin(self.view.to_image(screen));
                Some(PointerCapture::Stroke)
            }
            ToolMode::Regions => {
                if let Some(hit) = self.regions.hit_test(screen, &self.view) {
                    // Hitting another region's corner switches the active
                    // region and grabs that corner in one click
                    self.regions.select(hit.region);
                    Some(PointerCapture::RegionCorner(hit.corner))
                } else {
                    Some(PointerCapture::View)
                }
            }
        };
    }

    /// Continue the active gesture.
    pub fn pointer_move(&mut self, screen: Point, now: Instant) {
        match self.capture {
            None => {}
            Some(PointerCapture::View) => {
                self.view = self
                    .view
                    .pan(screen.x - self.last_screen.x, screen.y - self.last_screen.y);
            }
            Some(PointerCapture::Crop) => {
                if let Some(crop) = self.crop.as_mut() {
                    crop.pointer_move(screen, &self.view);
                }
            }
            Some(PointerCapture::Stroke) => {
                let from = self.view.to_image(self.last_screen);
                let to = self.view.to_image(screen);
                self.stroke.extend(from, to);
            }
            Some(PointerCapture::RegionCorner(corner)) => {
                self.regions
                    .drag_active_corner(corner, self.view.to_image(screen));
                self.scheduler.mark_dirty(&self.template_id, now);
            }
        }
        self.last_screen = screen;
    }

    /// End the gesture. A completed repair stroke yields an
    /// [`InpaintRequest`] for the host to send, or
    /// [`SessionError::InpaintBusy`] if one is already outstanding.
    pub fn pointer_up(&mut self) -> Result<Option<InpaintRequest>, SessionError> {
        let capture = self.capture.take();
        match capture {
            Some(PointerCapture::Crop) => {
                if let Some(crop) = self.crop.as_mut() {
                    crop.pointer_up();
                }
                Ok(None)
            }
            Some(PointerCapture::Stroke) => self.complete_stroke(),
            _ => Ok(None),
        }
    }

    /// The pointer leaving the canvas completes a stroke rather than
    /// cancelling it; for every other gesture it behaves like pointer-up.
    pub fn pointer_leave(&mut self) -> Result<Option<InpaintRequest>, SessionError> {
        self.pointer_up()
    }

    // ------------------------------------------------------------------
    // Repair (inpainting)
    // ------------------------------------------------------------------

    fn complete_stroke(&mut self) -> Result<Option<InpaintRequest>, SessionError> {
        // The overlay is cleared whatever happens next
        let Some(mask) = self.stroke.finish() else {
            return Ok(None);
        };
        if self.inpaint_in_flight {
            warn!("repair already in progress; stroke discarded");
            return Err(SessionError::InpaintBusy);
        }
        let image_base64 = encode_image_base64(&self.image)?;
        let mask_bitmap = full_mask(self.image_size(), &mask);
        let mask_base64 = encode_mask_base64(&mask_bitmap)?;
        self.inpaint_in_flight = true;
        debug!(
            x = mask.bounds.x,
            y = mask.bounds.y,
            width = mask.bounds.width,
            height = mask.bounds.height,
            "repair request assembled"
        );
        Ok(Some(InpaintRequest {
            image_base64,
            mask_base64,
        }))
    }

    /// Accept the repaired bitmap from the service; it becomes the new
    /// working image.
    pub fn apply_inpaint_result(&mut self, result_base64: &str) -> Result<(), SessionError> {
        self.inpaint_in_flight = false;
        let image = decode_image_base64(result_base64)?;
        self.replace_image(image);
        info!("repair applied");
        Ok(())
    }

    /// The repair call failed; the working image is unchanged and a new
    /// stroke may be started.
    pub fn fail_inpaint(&mut self, reason: &str) {
        warn!(reason, "repair request failed");
        self.inpaint_in_flight = false;
    }

    /// Synchronous convenience for hosts without their own transport:
    /// completes the round trip against the given service.
    pub fn run_inpaint(
        &mut self,
        service: &dyn InpaintService,
        request: InpaintRequest,
    ) -> Result<(), SessionError> {
        match service.repair(&request.image_base64, &request.mask_base64) {
            Ok(result) => self.apply_inpaint_result(&result),
            Err(e) => {
                self.fail_inpaint(&e.to_string());
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Crop
    // ------------------------------------------------------------------

    /// Commit the crop: the extracted sub-raster becomes the working image
    /// and the change is persisted immediately.
    pub fn commit_crop(&mut self, now: Instant) -> Result<(), SessionError> {
        let Some(crop) = self.crop.take() else {
            return Ok(());
        };
        let area = crop.area();
        let result = extract_crop(&self.image, area, self.settings.fill_mode);
        info!(
            width = result.width,
            height = result.height,
            "crop committed"
        );
        self.replace_image(result);
        self.persist_now(now)
    }

    /// Discard the crop rectangle without touching the image.
    pub fn cancel_crop(&mut self) {
        self.crop = None;
        debug!("crop cancelled");
    }

    fn replace_image(&mut self, image: RasterImage) {
        let resized = image.width != self.image.width || image.height != self.image.height;
        self.image = image;
        let size = self.image_size();
        self.stroke = StrokeRecorder::new(size, self.settings.brush_diameter);
        if resized {
            self.view = ViewState::fit_to_container(self.viewport, size);
        }
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    /// Add a region (discrete action: persisted immediately). `None` when
    /// the set is full.
    pub fn add_region(&mut self, now: Instant) -> Result<Option<u8>, SessionError> {
        let added = self.regions.add();
        if let Some(index) = added {
            debug!(index, "region added");
            self.persist_now(now)?;
        }
        Ok(added)
    }

    /// Remove a region (discrete action: persisted immediately). False when
    /// the set would become empty or the index is unknown.
    pub fn remove_region(&mut self, index: u8, now: Instant) -> Result<bool, SessionError> {
        if !self.regions.remove(index) {
            return Ok(false);
        }
        debug!(index, "region removed");
        self.persist_now(now)?;
        Ok(true)
    }

    pub fn select_region(&mut self, index: u8) -> bool {
        self.regions.select(index)
    }

    /// Keyboard nudge of one corner of the active region, persisted
    /// immediately.
    pub fn nudge_corner(
        &mut self,
        corner: usize,
        dx: f32,
        dy: f32,
        now: Instant,
    ) -> Result<(), SessionError> {
        self.regions.nudge_active_corner(corner, dx, dy);
        self.persist_now(now)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write any debounced edits whose deadline has passed. Failures are
    /// logged and dropped; the next edit re-arms the schedule.
    pub fn flush_due(&mut self, now: Instant) {
        for template_id in self.scheduler.flush_due(now) {
            let update = TemplateUpdate::from_state(&self.regions, &self.settings);
            if let Err(e) = self.store.update(&template_id, &update) {
                warn!(template = %template_id, error = %e, "debounced persistence failed");
            }
        }
    }

    pub fn has_pending_sync(&self) -> bool {
        self.scheduler.is_pending(&self.template_id)
    }

    fn persist_now(&mut self, _now: Instant) -> Result<(), SessionError> {
        self.scheduler.flush_now(&self.template_id);
        let update = TemplateUpdate::from_state(&self.regions, &self.settings);
        self.store.update(&self.template_id, &update).map_err(|e| {
            warn!(template = %self.template_id, error = %e, "template persistence failed");
            e
        })
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Hand the current working image to the save service.
    pub fn save_image(
        &self,
        service: &dyn SaveService,
        original_filename: &str,
    ) -> Result<SavedFile, SessionError> {
        let payload = encode_image_base64(&self.image)?;
        service.save(&payload, original_filename)
    }
}
