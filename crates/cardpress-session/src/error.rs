//! Error types for the editor session.
//!
//! Only I/O-shaped failures live here: everything geometric is clamped or
//! becomes a no-op inside the engines, and malformed persisted input is
//! defaulted at the deserialization boundary. A `SessionError` is always
//! something to show the operator; the in-memory edit state is left
//! unchanged so the action can be retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The image source could not produce a decoded raster.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// A raster could not be encoded into a service payload.
    #[error("Failed to encode image payload: {0}")]
    Encode(String),

    /// A service returned a bitmap that could not be decoded.
    #[error("Failed to decode service result: {0}")]
    Decode(String),

    /// The repair service rejected or failed the request.
    #[error("Repair request failed: {0}")]
    Inpaint(String),

    /// A repair request is already in flight; new strokes are rejected
    /// rather than queued.
    #[error("A repair operation is already in progress")]
    InpaintBusy,

    /// The save service failed.
    #[error("Failed to save image: {0}")]
    Save(String),

    /// Template persistence failed. Non-fatal: the next edit retries.
    #[error("Failed to persist template changes: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::InpaintBusy;
        assert_eq!(err.to_string(), "A repair operation is already in progress");

        let err = SessionError::Persistence("connection reset".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to persist template changes: connection reset"
        );
    }
}
