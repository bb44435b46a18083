use crate::config::Settings;
use crate::llm::error::InferenceUnavailable;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = settings
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .openai_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                settings.llm_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, req: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: req.prompt.clone(),
            }],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }
    }

    async fn create_chat_completion(
        &self,
        body: &ChatCompletionRequest,
    ) -> anyhow::Result<ChatCompletionResponse> {
        let res = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                InferenceUnavailable::new(Provider::OpenAI, "request", format!("{e}"))
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            InferenceUnavailable::new(
                Provider::OpenAI,
                "request",
                format!("failed to read response body: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(
                InferenceUnavailable::new(Provider::OpenAI, "http", format!("status={status}"))
                    .with_raw_output(text)
                    .into(),
            );
        }

        serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            InferenceUnavailable::new(
                Provider::OpenAI,
                "decode",
                format!("failed to decode chat completion: {e}"),
            )
            .with_raw_output(text)
            .into()
        })
    }

    fn response_text(res: &ChatCompletionResponse) -> Option<String> {
        res.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        let body = self.request_body(&req);
        let res = self.create_chat_completion(&body).await?;

        if let Some(reason) = res.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                tracing::warn!(
                    model = %self.model,
                    "OpenAI finish_reason=length; response truncated"
                );
            }
        }

        Self::response_text(&res).ok_or_else(|| {
            InferenceUnavailable::new(Provider::OpenAI, "empty", "completion had no text content")
                .into()
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
