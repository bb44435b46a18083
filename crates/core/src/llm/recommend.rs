use crate::config::Settings;
use crate::domain::financials::FinancialSnapshot;
use crate::domain::news::NewsArticle;
use crate::domain::recommendation::{Action, Recommendation};
use crate::domain::symbol::Symbol;
use crate::llm::action::classify_action;
use crate::llm::prompt::build_prompt;
use crate::llm::{client_from_settings, CompletionRequest, LlmClient};
use std::sync::Arc;

const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Turns news and fundamentals into a classified recommendation with one completion call.
#[derive(Clone)]
pub struct RecommendationEngine {
    llm: Arc<dyn LlmClient>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RecommendationEngine {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let llm = client_from_settings(settings)?;
        let temperature = settings.llm_temperature.unwrap_or(DEFAULT_TEMPERATURE);
        anyhow::ensure!(
            (0.0..=2.0).contains(&temperature),
            "LLM_TEMPERATURE must be in [0, 2] (got {temperature})"
        );
        Ok(Self {
            llm,
            temperature,
            max_tokens: settings.llm_max_tokens,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub async fn generate(
        &self,
        symbol: &Symbol,
        articles: &[NewsArticle],
        financials: &FinancialSnapshot,
    ) -> anyhow::Result<Recommendation> {
        let prompt = build_prompt(symbol, articles, financials);
        let response = self
            .llm
            .complete(CompletionRequest {
                prompt,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            })
            .await?;

        let action = classify_action(&response);
        if action == Action::Unknown {
            tracing::warn!(
                %symbol,
                provider = self.llm.provider().name(),
                "no action word in model response; classified as Unknown"
            );
        } else {
            tracing::info!(%symbol, %action, "classified recommendation");
        }

        Ok(Recommendation {
            action,
            rationale: response,
        })
    }
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("provider", &self.llm.provider())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
