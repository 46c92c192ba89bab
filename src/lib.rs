//! # visionai
//!
//! Identify images with Vision Language Models (VLMs) and present the
//! analysis as plain text, a JSON section tree, or a structured report, with
//! export to text, JSON and paginated PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image path / URL
//!  │
//!  ├─ 1. Input      read local file or download URL, sniff image type
//!  ├─ 2. Encode     optional downscale → base64 ImageData
//!  ├─ 3. Identify   VLM call with prompt + image
//!  ├─ 4. Clean      strip fences / emphasis, collapse blank lines
//!  ├─ 5. Keywords   pure heuristic filter
//!  ├─ 6. Questions  second, text-only VLM call
//!  └─ 7. Output     GeneratedOutput appended to the session log
//!                     │
//!                     ├─ formatter  plain / json / structured
//!                     ├─ screen     terminal rendering
//!                     └─ export     .txt / .json / .pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use visionai::{analyze, AnalysisConfig, AnalysisOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = AnalysisConfig::default();
//!     match analyze("cat.jpg", &config).await? {
//!         AnalysisOutcome::Completed(out) => println!("{}", out.content),
//!         AnalysisOutcome::Failed(f) => eprintln!("{f}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Formatting without a model
//!
//! ```rust
//! use visionai::formatter::format_output;
//!
//! let formatted = format_output("Important Information:\n1. It is a cat", None);
//! assert!(formatted.structured.starts_with("## Important Information:"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `visionai` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! visionai = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod export;
pub mod formatter;
pub mod grammar;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod screen;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{AnalysisFailure, AnalysisRequest};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DetailLevel, OutputFormat};
pub use error::{ModelError, VisionError};
pub use export::{export_to_dir, render_export, ExportKind, ExportOptions};
pub use formatter::{format_output, to_json, to_structured_report, FormattedOutput};
pub use grammar::{Dialect, LineKind};
pub use output::{GeneratedOutput, OutputKind, OutputMetadata};
pub use pipeline::llm::{ModelRequest, ModelResponse, VisionModel};
pub use progress::{AnalysisProgressCallback, ModelStage, NoopProgressCallback, ProgressCallback};
pub use session::{analyze, AnalysisOutcome, Session};
