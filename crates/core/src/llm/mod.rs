pub mod action;
pub mod anthropic;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod recommend;

use crate::config::Settings;
use std::sync::Arc;

/// Single-turn completion request: one user message, no history.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the raw response text. Failures are `InferenceUnavailable`.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String>;
}

pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    match settings.llm_provider.as_deref().unwrap_or("openai") {
        "openai" => Ok(Arc::new(openai::OpenAiClient::from_settings(settings)?)),
        "anthropic" => Ok(Arc::new(anthropic::AnthropicClient::from_settings(settings)?)),
        other => anyhow::bail!("unsupported LLM_PROVIDER: {other}"),
    }
}
