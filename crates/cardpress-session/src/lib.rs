//! Session shell for the cardpress editor.
//!
//! `cardpress-core` holds the pure editing engines; this crate wires them
//! into an [`EditorSession`] that routes input events, assembles service
//! payloads, and schedules debounced persistence. Hosts implement the
//! traits in [`services`] to supply images, repair, saving, and template
//! storage.

pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod sync;

pub use config::EditorSettings;
pub use error::SessionError;
pub use services::{
    decode_image_base64, encode_image_base64, encode_mask_base64, ImageSource, InpaintService,
    SaveService, SavedFile, TemplateStore, TemplateUpdate,
};
pub use session::{EditorSession, InpaintRequest, ToolMode};
pub use sync::{SyncScheduler, DEBOUNCE_DELAY};
