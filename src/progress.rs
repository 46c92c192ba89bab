//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events while an analysis runs. The CLI uses it to drive a spinner; a GUI
//! host could use it to show a loader.
//!
//! # Example
//!
//! ```rust
//! use visionai::{AnalysisConfig, AnalysisProgressCallback, ModelStage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     calls: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_model_call_complete(&self, _stage: ModelStage, _chars: usize) {
//!         self.calls.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { calls: AtomicUsize::new(0) });
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Which model call an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStage {
    /// The identification call carrying the image.
    Identify,
    /// The text-only follow-up call producing related questions.
    RelatedQuestions,
}

impl fmt::Display for ModelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStage::Identify => f.write_str("identify"),
            ModelStage::RelatedQuestions => f.write_str("related questions"),
        }
    }
}

/// Called by the analysis pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once the image is loaded and the first model call is about to start.
    fn on_analysis_start(&self, source: &str) {
        let _ = source;
    }

    /// Called just before a model request is sent.
    fn on_model_call_start(&self, stage: ModelStage) {
        let _ = stage;
    }

    /// Called when a model call returns text.
    ///
    /// * `chars`: character count of the cleaned response
    fn on_model_call_complete(&self, stage: ModelStage, chars: usize) {
        let _ = (stage, chars);
    }

    /// Called when a model call fails after all retries.
    fn on_model_call_error(&self, stage: ModelStage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the analysis finished, successfully or not.
    fn on_analysis_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
