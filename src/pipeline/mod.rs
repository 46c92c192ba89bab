//! Pipeline stages for image analysis.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the model transport can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ postprocess ──▶ keywords
//! (path/URL) (base64)  (VLM)   (cleanup)      └─▶ questions (second call)
//! ```
//!
//! 1. [`input`]: read a local file or download a URL, sniff the image type
//! 2. [`encode`]: optional downscale, base64-wrap for the request body
//! 3. [`llm`]: the [`llm::VisionModel`] seam and the provider-backed model
//! 4. [`postprocess`]: reduce the loose Markdown answer to plain text
//! 5. [`keywords`]: pure keyword filter over the cleaned text
//! 6. [`questions`]: text-only follow-up call for related questions

pub mod encode;
pub mod input;
pub mod keywords;
pub mod llm;
pub mod postprocess;
pub mod questions;
