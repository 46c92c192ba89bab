//! An interactive analysis session: one loaded image, the current result,
//! and the append-only log of generated outputs.
//!
//! Every action takes `&mut self`, so a session runs at most one analysis at
//! a time. Hosts that want overlapping requests need one session each.

use crate::analyze::{run_analysis, AnalysisFailure, AnalysisRequest};
use crate::config::{AnalysisConfig, DetailLevel, OutputFormat};
use crate::error::VisionError;
use crate::output::{GeneratedOutput, OutputMetadata};
use crate::pipeline::encode::prepare_image;
use crate::pipeline::input::{self, LoadedImage};
use crate::pipeline::llm::{resolve_model, VisionModel};
use chrono::Local;
use edgequake_llm::ImageData;
use std::sync::Arc;
use tracing::info;

/// Result of one action.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The new entry appended to the output log.
    Completed(GeneratedOutput),
    /// Nothing was appended; the failure text is the visible result.
    Failed(AnalysisFailure),
}

impl AnalysisOutcome {
    /// Text to show for this outcome.
    pub fn display_text(&self) -> String {
        match self {
            AnalysisOutcome::Completed(out) => out.content.clone(),
            AnalysisOutcome::Failed(f) => f.user_message(),
        }
    }

    pub fn output(&self) -> Option<&GeneratedOutput> {
        match self {
            AnalysisOutcome::Completed(out) => Some(out),
            AnalysisOutcome::Failed(_) => None,
        }
    }
}

struct PreparedImage {
    loaded: LoadedImage,
    payload: ImageData,
}

/// Holds the loaded image and everything derived from it.
pub struct Session {
    config: AnalysisConfig,
    model: Arc<dyn VisionModel>,
    image: Option<PreparedImage>,
    result: Option<String>,
    keywords: Vec<String>,
    questions: Vec<String>,
    outputs: Vec<GeneratedOutput>,
    last_id: u64,
}

impl Session {
    /// Create a session, resolving the model client from `config`.
    pub fn new(config: AnalysisConfig) -> Result<Self, VisionError> {
        let model = resolve_model(&config)?;
        info!("Session using model {}", model.name());
        Ok(Self {
            config,
            model,
            image: None,
            result: None,
            keywords: Vec::new(),
            questions: Vec::new(),
            outputs: Vec::new(),
            last_id: 0,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_detail_level(&mut self, level: DetailLevel) {
        self.config.detail_level = level;
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.config.format = format;
    }

    /// Load an image from a path or URL, replacing the previous one.
    pub async fn load_image(&mut self, input: &str) -> Result<(), VisionError> {
        let loaded = input::load_image(input, self.config.download_timeout_secs).await?;
        self.install(loaded)
    }

    /// Load an image from memory, replacing the previous one.
    pub fn load_image_bytes(
        &mut self,
        source_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), VisionError> {
        let loaded = LoadedImage::from_bytes(source_name, bytes)?;
        self.install(loaded)
    }

    /// A rejected image leaves the previous state untouched; an accepted one
    /// clears the result, keywords and questions. The output log is kept.
    fn install(&mut self, loaded: LoadedImage) -> Result<(), VisionError> {
        let payload = prepare_image(&loaded, self.config.max_image_edge)?;
        info!("Loaded image {}", loaded.source_name);
        self.image = Some(PreparedImage { loaded, payload });
        self.result = None;
        self.keywords.clear();
        self.questions.clear();
        Ok(())
    }

    pub fn image_name(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.loaded.source_name.as_str())
    }

    /// Identify the loaded image.
    pub async fn identify(&mut self) -> Result<AnalysisOutcome, VisionError> {
        self.run(AnalysisRequest::Describe).await
    }

    /// Regenerate the analysis with a focus on `keyword`.
    pub async fn regenerate_for_keyword(&mut self, keyword: &str) -> Result<AnalysisOutcome, VisionError> {
        self.run(AnalysisRequest::FocusKeyword(keyword.to_string())).await
    }

    /// Answer `question` about the loaded image.
    pub async fn ask_related_question(&mut self, question: &str) -> Result<AnalysisOutcome, VisionError> {
        self.run(AnalysisRequest::AskQuestion(question.to_string())).await
    }

    /// Run one action. Errors only when no image is loaded; model failures
    /// come back as [`AnalysisOutcome::Failed`].
    pub async fn run(&mut self, request: AnalysisRequest) -> Result<AnalysisOutcome, VisionError> {
        let image = self.image.as_ref().ok_or(VisionError::NoImageLoaded)?;

        let analysis = run_analysis(
            self.model.as_ref(),
            &image.payload,
            &request,
            &image.loaded.source_name,
            &self.config,
        )
        .await;

        match analysis {
            Ok(a) => {
                let output = GeneratedOutput {
                    id: self.next_id(),
                    kind: request.kind(),
                    content: a.text.clone(),
                    timestamp: Local::now(),
                    format: self.config.format,
                    detail_level: self.config.detail_level,
                    metadata: OutputMetadata::new(a.keywords.clone(), a.questions.clone()),
                };
                self.result = Some(a.text);
                self.keywords = a.keywords;
                self.questions = a.questions;
                self.outputs.push(output.clone());
                Ok(AnalysisOutcome::Completed(output))
            }
            Err(failure) => {
                self.result = Some(failure.user_message());
                Ok(AnalysisOutcome::Failed(failure))
            }
        }
    }

    /// Wall-clock milliseconds, bumped past the previous id when the clock
    /// has not moved on.
    fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Local::now().timestamp_millis()).unwrap_or(0);
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    /// The visible result: the latest analysis text or failure message.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// All generated outputs, oldest first.
    pub fn outputs(&self) -> &[GeneratedOutput] {
        &self.outputs
    }

    pub fn latest(&self) -> Option<&GeneratedOutput> {
        self.outputs.last()
    }
}

/// Load `input`, identify it once, and return the outcome.
///
/// The one-shot counterpart of [`Session`].
pub async fn analyze(input: &str, config: &AnalysisConfig) -> Result<AnalysisOutcome, VisionError> {
    let mut session = Session::new(config.clone())?;
    session.load_image(input).await?;
    session.identify().await
}
