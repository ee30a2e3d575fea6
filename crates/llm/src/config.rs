use std::sync::Arc;

use async_trait::async_trait;
use brain_common::{BrainError, Result};
use serde::{Deserialize, Serialize};

use crate::anthropic::AnthropicClient;
use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::openai::OpenAiClient;
use crate::retry::{CallPolicy, RetryingClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" (any OpenAI-compatible endpoint, including Ollama) or "anthropic"
    pub provider: String,
    pub model: String,
    /// If not set, read from OPENAI_API_KEY / ANTHROPIC_API_KEY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub policy: CallPolicy,
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            api_url: None,
            temperature: Some(0.0),
            max_tokens: None,
            max_concurrent_requests: default_max_concurrent(),
            policy: CallPolicy::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment variables.
    ///
    /// Priority:
    /// 1. Explicit, non-empty `api_key`
    /// 2. `OPENAI_API_KEY` or `ANTHROPIC_API_KEY`, by provider
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok()
    }
}

/// Caps the number of in-flight requests to the wrapped client.
pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| BrainError::Capability(format!("Semaphore acquire failed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build the bare provider client described by `config`.
///
/// Neither the call policy nor the concurrency cap is applied here; see
/// [`with_call_policy`].
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "openai" | "ollama" => Arc::new(OpenAiClient::new(
            config.api_url.clone(),
            config.model.clone(),
            config.resolve_api_key(),
        )),
        "anthropic" => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                BrainError::Config("Anthropic requires an API key".to_string())
            })?;
            Arc::new(AnthropicClient::new(config.model.clone(), api_key))
        }
        other => {
            return Err(BrainError::Config(format!(
                "Unknown LLM provider: {other}"
            )));
        }
    };
    Ok(client)
}

/// Wrap `client` as `Semaphored(Retrying(client))`.
///
/// The permit is taken before the first attempt starts, so time spent
/// queued behind other requests never counts against `policy.timeout_ms`.
pub fn with_call_policy(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Arc<dyn LlmClient> {
    let retrying: Arc<dyn LlmClient> =
        Arc::new(RetryingClient::new(client, config.policy.clone()));
    Arc::new(SemaphoredClient::new(
        retrying,
        config.max_concurrent_requests,
    ))
}
