use crate::config::Settings;
use crate::llm::error::InferenceUnavailable;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: HeaderValue,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut api_key = HeaderValue::from_str(settings.require_anthropic_api_key()?)
            .context("ANTHROPIC_API_KEY is not a valid header value")?;
        api_key.set_sensitive(true);
        let base_url = settings
            .anthropic_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .anthropic_model
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

    fn request_body(&self, req: &CompletionRequest) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            // The Messages API requires an explicit ceiling.
            max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![Message {
                role: "user",
                content: req.prompt.clone(),
            }],
            temperature: req.temperature,
        }
    }

    async fn create_message(
        &self,
        req: &CreateMessageRequest,
    ) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", self.api_key.clone());
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .map_err(|e| {
                InferenceUnavailable::new(Provider::Anthropic, "request", format!("{e}"))
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            InferenceUnavailable::new(
                Provider::Anthropic,
                "request",
                format!("failed to read response body: {e}"),
            )
        })?;
        if !status.is_success() {
            return Err(InferenceUnavailable::new(
                Provider::Anthropic,
                "http",
                format!("status={status}"),
            )
            .with_raw_output(text)
            .into());
        }

        serde_json::from_str::<CreateMessageResponse>(&text).map_err(|e| {
            InferenceUnavailable::new(
                Provider::Anthropic,
                "decode",
                format!("failed to decode Anthropic response: {e}"),
            )
            .with_raw_output(text)
            .into()
        })
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Unknown => {
                    // Ignore thinking/tool blocks.
                }
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        let body = self.request_body(&req);
        let res = self.create_message(&body).await?;

        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                max_tokens = body.max_tokens,
                "Anthropic stop_reason=max_tokens; response truncated"
            );
        }

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(InferenceUnavailable::new(
                Provider::Anthropic,
                "empty",
                "response had no text blocks",
            )
            .into());
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}
