//! Configuration types for image analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The identify call and the follow-up
//! related-questions call share one config.

use crate::error::VisionError;
use crate::pipeline::llm::VisionModel;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Provider used together with [`DEFAULT_MODEL`].
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Configuration for an image analysis session.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use visionai::{AnalysisConfig, DetailLevel};
///
/// let config = AnalysisConfig::builder()
///     .detail_level(DetailLevel::Large)
///     .model("gemini-2.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model client. Takes precedence over everything else.
    ///
    /// Lets callers plug in their own transport, or a scripted model in tests.
    pub client: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature. Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 2048.
    pub max_tokens: usize,

    /// Retry attempts on a failed model call. Default: 0.
    ///
    /// Timeouts and transport retries belong to the provider client; this is
    /// an extra, opt-in layer on top.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// How much detail the identification prompt asks for. Default: Medium.
    pub detail_level: DetailLevel,

    /// Representation shown on screen and used for PDF bodies. Default: Plain.
    pub format: OutputFormat,

    /// Longest image edge in pixels before the image is downscaled. Default: 2048.
    ///
    /// `None` uploads the image bytes untouched.
    pub max_image_edge: Option<u32>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Number of related questions kept from the follow-up call. Default: 5.
    pub question_count: usize,

    /// Number of keywords extracted from the analysis text. Default: 8.
    pub keyword_limit: usize,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            client: None,
            temperature: 0.4,
            max_tokens: 2048,
            max_retries: 0,
            retry_backoff_ms: 500,
            detail_level: DetailLevel::default(),
            format: OutputFormat::default(),
            max_image_edge: Some(2048),
            download_timeout_secs: 120,
            question_count: 5,
            keyword_limit: 8,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("detail_level", &self.detail_level)
            .field("format", &self.format)
            .field("max_image_edge", &self.max_image_edge)
            .field("question_count", &self.question_count)
            .field("keyword_limit", &self.keyword_limit)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn client(mut self, client: Arc<dyn VisionModel>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn detail_level(mut self, level: DetailLevel) -> Self {
        self.config.detail_level = level;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn max_image_edge(mut self, px: Option<u32>) -> Self {
        self.config.max_image_edge = px.map(|p| p.max(64));
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn question_count(mut self, n: usize) -> Self {
        self.config.question_count = n;
        self
    }

    pub fn keyword_limit(mut self, n: usize) -> Self {
        self.config.keyword_limit = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, VisionError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(VisionError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(VisionError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How much detail the model is asked to produce.
///
/// | Level    | Label      | Description            |
/// |----------|------------|------------------------|
/// | `short`  | Short      | Brief overview         |
/// | `medium` | Medium     | Balanced detail        |
/// | `large`  | Detailed   | Comprehensive analysis |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Short,
    #[default]
    Medium,
    Large,
}

impl DetailLevel {
    /// Lower-case identifier used in file names and export headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Short => "short",
            DetailLevel::Medium => "medium",
            DetailLevel::Large => "large",
        }
    }

    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            DetailLevel::Short => "Short",
            DetailLevel::Medium => "Medium",
            DetailLevel::Large => "Detailed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DetailLevel::Short => "Brief overview",
            DetailLevel::Medium => "Balanced detail",
            DetailLevel::Large => "Comprehensive analysis",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(DetailLevel::Short),
            "medium" => Ok(DetailLevel::Medium),
            "large" | "detailed" => Ok(DetailLevel::Large),
            other => Err(VisionError::InvalidConfig(format!(
                "unknown detail level '{other}' (expected short, medium or large)"
            ))),
        }
    }
}

/// The three presentations of one analysis text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The cleaned model output, unchanged.
    #[default]
    Plain,
    /// The section tree produced by [`crate::formatter::to_json`].
    Json,
    /// The Markdown-like report produced by [`crate::formatter::to_structured_report`].
    Structured,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
            OutputFormat::Structured => "structured",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "text" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            "structured" | "report" => Ok(OutputFormat::Structured),
            other => Err(VisionError::InvalidConfig(format!(
                "unknown output format '{other}' (expected plain, json or structured)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.detail_level, DetailLevel::Medium);
        assert_eq!(c.format, OutputFormat::Plain);
        assert_eq!(c.question_count, 5);
        assert_eq!(c.keyword_limit, 8);
        assert_eq!(c.max_retries, 0);
    }

    #[test]
    fn builder_clamps() {
        let c = AnalysisConfig::builder()
            .temperature(9.0)
            .max_image_edge(Some(10))
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.max_image_edge, Some(64));
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = AnalysisConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn detail_level_parsing() {
        assert_eq!("SHORT".parse::<DetailLevel>().unwrap(), DetailLevel::Short);
        assert_eq!("detailed".parse::<DetailLevel>().unwrap(), DetailLevel::Large);
        assert!("huge".parse::<DetailLevel>().is_err());
        assert_eq!(DetailLevel::Large.label(), "Detailed");
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("report".parse::<OutputFormat>().unwrap(), OutputFormat::Structured);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn detail_level_serialises_lowercase() {
        let s = serde_json::to_string(&DetailLevel::Large).unwrap();
        assert_eq!(s, "\"large\"");
    }
}
