//! Records produced by an analysis session.

use crate::config::{DetailLevel, OutputFormat};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Keywords and follow-up questions attached to one analysis text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub keywords: Vec<String>,
    pub questions: Vec<String>,
}

impl OutputMetadata {
    pub fn new(keywords: Vec<String>, questions: Vec<String>) -> Self {
        Self {
            keywords,
            questions,
        }
    }

    /// True when there is nothing worth rendering.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.questions.is_empty()
    }
}

/// Which action produced an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Plain identification of the loaded image.
    Analysis,
    /// Identification regenerated around a keyword.
    KeywordFocus,
    /// Identification answering one of the related questions.
    QuestionAnswer,
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Analysis => "Image Analysis",
            OutputKind::KeywordFocus => "Keyword Focus",
            OutputKind::QuestionAnswer => "Question Answer",
        }
    }
}

/// One entry of the session's output log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutput {
    /// Unique, time-derived, strictly increasing within a session.
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub format: OutputFormat,
    pub detail_level: DetailLevel,
    pub metadata: OutputMetadata,
}
