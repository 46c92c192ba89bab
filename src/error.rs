//! Error types for the visionai library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`VisionError`]: **Fatal**: the action cannot proceed at all
//!   (missing image file, not an image, provider not configured, export
//!   could not be written). Returned as `Err(VisionError)` from the
//!   top-level functions.
//!
//! * [`ModelError`]: **Non-fatal**: a single model call failed. The
//!   identification call turns it into a user-facing result text (see
//!   [`crate::analyze::AnalysisFailure`]); the related-questions call
//!   swallows it and continues with an empty list.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the visionai library.
#[derive(Debug, Error)]
pub enum VisionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not an image format we recognise.
    #[error("'{source_name}' is not a supported image\nFirst bytes: {magic:?}")]
    NotAnImage { source_name: String, magic: Vec<u8> },

    /// The image was recognised but could not be decoded or re-encoded.
    #[error("Failed to prepare image '{source_name}': {detail}")]
    ImageEncodingFailed { source_name: String, detail: String },

    /// An analysis was requested before any image was loaded.
    #[error("No image loaded.\nLoad an image before requesting an analysis.")]
    NoImageLoaded,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The laid-out document could not be encoded as PDF.
    #[error("PDF encoding failed: {0}")]
    PdfEncodingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single model call.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ModelError {
    /// The provider returned an error with a message.
    #[error("{message}")]
    Api { message: String },

    /// The provider failed without anything we can show the user.
    #[error("unrecognised model failure")]
    Unrecognised,
}

impl ModelError {
    /// Build an [`ModelError::Api`], falling back to
    /// [`ModelError::Unrecognised`] when the message is blank.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ModelError::Unrecognised
        } else {
            ModelError::Api { message }
        }
    }
}
