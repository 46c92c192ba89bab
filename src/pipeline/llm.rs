//! Model interaction: the [`VisionModel`] seam and its provider-backed
//! implementation.
//!
//! Every model call in the crate goes through [`VisionModel::generate`]: one
//! prompt, optionally one image, one text back. Production code uses
//! [`ProviderModel`], which drives an `edgequake_llm` provider with retry
//! and exponential backoff (`retry_backoff_ms * 2^(attempt-1)`). Tests plug
//! in a scripted model through [`crate::config::AnalysisConfig::client`].

use crate::config::{AnalysisConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::{ModelError, VisionError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// One model request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
    /// Inline image; `None` for text-only requests.
    pub image: Option<ImageData>,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageData) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// Raw model answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A generative model that accepts a prompt and an optional image.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// [`VisionModel`] backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    name: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            name: name.into(),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }
}

#[async_trait]
impl VisionModel for ProviderModel {
    fn name(&self) -> &str {
        &self.name
    }

    /// The request is sent as a single user turn carrying the prompt and,
    /// when present, the image.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let start = Instant::now();
        let images: Vec<ImageData> = request.image.iter().cloned().collect();
        let messages = vec![ChatMessage::user_with_images(&request.prompt, images)];

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    self.name, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&self.options)).await {
                Ok(response) => {
                    debug!(
                        "{}: {} input tokens, {} output tokens, {:?}",
                        self.name,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(ModelResponse {
                        text: response.content,
                        prompt_tokens: response.prompt_tokens,
                        completion_tokens: response.completion_tokens,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    warn!("{}: attempt {} failed: {}", self.name, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(last_err
            .map(ModelError::from_message)
            .unwrap_or(ModelError::Unrecognised))
    }
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, VisionError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        VisionError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. Pre-built client (`config.client`).
/// 2. Pre-built provider (`config.provider`).
/// 3. Named provider + model (`config.provider_name`).
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 5. `GEMINI_API_KEY` present: gemini with [`DEFAULT_MODEL`].
/// 6. `ProviderFactory::from_env` auto-detection.
pub fn resolve_model(config: &AnalysisConfig) -> Result<Arc<dyn VisionModel>, VisionError> {
    if let Some(client) = &config.client {
        return Ok(Arc::clone(client));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let wrap = |provider: Arc<dyn LLMProvider>, name: String| -> Arc<dyn VisionModel> {
        Arc::new(ProviderModel::new(provider, name, config))
    };

    if let Some(provider) = &config.provider {
        return Ok(wrap(Arc::clone(provider), "provider".to_string()));
    }

    if let Some(name) = &config.provider_name {
        let provider = create_provider(name, model)?;
        return Ok(wrap(provider, format!("{name}/{model}")));
    }

    if let (Some(prov), Some(env_model)) = (
        non_empty_var("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_var("EDGEQUAKE_MODEL"),
    ) {
        let provider = create_provider(&prov, &env_model)?;
        return Ok(wrap(provider, format!("{prov}/{env_model}")));
    }

    if non_empty_var("GEMINI_API_KEY").is_some() {
        let provider = create_provider(DEFAULT_PROVIDER, model)?;
        return Ok(wrap(provider, format!("{DEFAULT_PROVIDER}/{model}")));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| VisionError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(wrap(llm_provider, "auto".to_string()))
}
