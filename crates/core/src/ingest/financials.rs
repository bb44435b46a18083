use crate::config::Settings;
use crate::domain::financials::FinancialSnapshot;
use crate::domain::symbol::Symbol;
use crate::error::{ProviderUnavailable, Stage};
use crate::ingest::http_client;
use anyhow::Result;
use serde_json::Value;

const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

// Alpha Vantage reports errors and throttling inside a 200 body under these keys.
const ERROR_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

#[async_trait::async_trait]
pub trait FinancialsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fundamentals overview for `symbol`. Every failure is `ProviderUnavailable`.
    async fn fetch_financials(&self, symbol: &Symbol) -> Result<FinancialSnapshot>;
}

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings.provider_timeout_secs)?,
            base_url: settings
                .fin_base_url
                .clone()
                .unwrap_or_else(|| ALPHA_VANTAGE_BASE_URL.to_string()),
            api_key: settings.require_fin_api_key()?.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl FinancialsProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_financials(&self, symbol: &Symbol) -> Result<FinancialSnapshot> {
        let provider = self.provider_name();
        let unavailable =
            |detail: String| ProviderUnavailable::new(Stage::Financials, provider, detail);

        let res = self
            .http
            .get(self.url())
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}: {text}")).into());
        }

        let snapshot = parse_overview(&text).map_err(unavailable)?;
        tracing::info!(%symbol, metrics = snapshot.len(), "fetched financials");
        Ok(snapshot)
    }
}

/// Parses an OVERVIEW body into a snapshot, rejecting empty and error-only bodies.
pub fn parse_overview(text: &str) -> std::result::Result<FinancialSnapshot, String> {
    let value = serde_json::from_str::<Value>(text)
        .map_err(|e| format!("response is not valid JSON: {e}"))?;

    let Value::Object(map) = value else {
        return Err(format!("expected a JSON object, got: {text}"));
    };

    if map.is_empty() {
        return Err("empty overview (unknown symbol?)".to_string());
    }

    if map.keys().all(|k| ERROR_KEYS.contains(&k.as_str())) {
        let detail = ERROR_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .unwrap_or_default();
        return Err(format!("provider reported an error: {detail}"));
    }

    Ok(map.into_iter().collect())
}
