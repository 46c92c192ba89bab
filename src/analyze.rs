//! One analysis action: identify the image, clean the answer, extract
//! keywords, then ask for related questions.
//!
//! The two model calls run strictly one after the other because the
//! questions prompt embeds the identification text. A failed identification
//! becomes an [`AnalysisFailure`] whose message is shown in place of a
//! result; a failed questions call only empties the question list.

use crate::config::{AnalysisConfig, DetailLevel};
use crate::error::ModelError;
use crate::output::OutputKind;
use crate::pipeline::keywords::extract_keywords;
use crate::pipeline::llm::{ModelRequest, VisionModel};
use crate::pipeline::postprocess::clean_response;
use crate::pipeline::questions::generate_questions;
use crate::progress::ModelStage;
use crate::prompts;
use edgequake_llm::ImageData;
use std::fmt;
use tracing::{info, warn};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Identify the image.
    Describe,
    /// Identify again, focusing on a keyword.
    FocusKeyword(String),
    /// Answer one of the related questions.
    AskQuestion(String),
}

impl AnalysisRequest {
    pub fn kind(&self) -> OutputKind {
        match self {
            AnalysisRequest::Describe => OutputKind::Analysis,
            AnalysisRequest::FocusKeyword(_) => OutputKind::KeywordFocus,
            AnalysisRequest::AskQuestion(_) => OutputKind::QuestionAnswer,
        }
    }

    /// The full identification prompt for this request.
    pub fn prompt(&self, level: DetailLevel) -> String {
        let additional = match self {
            AnalysisRequest::Describe => String::new(),
            AnalysisRequest::FocusKeyword(k) => prompts::keyword_focus(k, level),
            AnalysisRequest::AskQuestion(q) => prompts::answer_question(q, level),
        };
        prompts::identify_prompt(level, &additional)
    }
}

/// Why an identification produced no analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisFailure {
    /// The service reported 503 / overloaded.
    Overloaded,
    /// Any other failure with a message.
    Model { message: String },
    /// A failure with nothing to show.
    Unknown,
}

impl AnalysisFailure {
    /// Classify a model error. The overload check is case-insensitive and
    /// needs both `503` and `overloaded` in the message.
    pub fn classify(err: &ModelError) -> Self {
        match err {
            ModelError::Api { message } => {
                let lower = message.to_lowercase();
                if lower.contains("503") && lower.contains("overloaded") {
                    AnalysisFailure::Overloaded
                } else {
                    AnalysisFailure::Model {
                        message: message.clone(),
                    }
                }
            }
            ModelError::Unrecognised => AnalysisFailure::Unknown,
        }
    }

    /// Text shown in place of the analysis.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisFailure::Overloaded => {
                "The AI model is currently overloaded. Please try again in a few minutes.".into()
            }
            AnalysisFailure::Model { message } => format!("Error identifying image: {message}"),
            AnalysisFailure::Unknown => {
                "An unknown error occurred while identifying the image.".into()
            }
        }
    }
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// A successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Cleaned identification text.
    pub text: String,
    pub keywords: Vec<String>,
    /// Empty when the questions call failed.
    pub questions: Vec<String>,
}

/// Run `request` against an already-encoded image.
pub async fn run_analysis(
    model: &dyn VisionModel,
    image: &ImageData,
    request: &AnalysisRequest,
    source_name: &str,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisFailure> {
    let cb = config.progress_callback.as_deref();
    info!("Analysing {} ({:?}, detail: {})", source_name, request.kind(), config.detail_level);
    if let Some(cb) = cb {
        cb.on_analysis_start(source_name);
        cb.on_model_call_start(ModelStage::Identify);
    }

    let identify = ModelRequest::with_image(request.prompt(config.detail_level), image.clone());
    let response = match model.generate(&identify).await {
        Ok(r) => r,
        Err(e) => {
            let failure = AnalysisFailure::classify(&e);
            warn!("Identification failed: {}", e);
            if let Some(cb) = cb {
                cb.on_model_call_error(ModelStage::Identify, &e.to_string());
                cb.on_analysis_complete(false);
            }
            return Err(failure);
        }
    };

    let text = clean_response(&response.text);
    if let Some(cb) = cb {
        cb.on_model_call_complete(ModelStage::Identify, text.chars().count());
    }
    let keywords = extract_keywords(&text, config.keyword_limit);

    if let Some(cb) = cb {
        cb.on_model_call_start(ModelStage::RelatedQuestions);
    }
    let questions = match generate_questions(model, &text, config.question_count).await {
        Ok(q) => {
            if let Some(cb) = cb {
                cb.on_model_call_complete(ModelStage::RelatedQuestions, q.len());
            }
            q
        }
        Err(e) => {
            warn!("Related questions failed, continuing without: {}", e);
            if let Some(cb) = cb {
                cb.on_model_call_error(ModelStage::RelatedQuestions, &e.to_string());
            }
            Vec::new()
        }
    };

    if let Some(cb) = cb {
        cb.on_analysis_complete(true);
    }
    Ok(Analysis {
        text,
        keywords,
        questions,
    })
}
