use crate::config::Settings;
use crate::domain::news::NewsArticle;
use crate::error::{ProviderUnavailable, Stage};
use crate::ingest::http_client;
use crate::ingest::types::{NewsApiResponse, NewsCatcherResponse};
use crate::time::window::NewsWindow;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const NEWSAPI_BASE_URL: &str = "https://newsapi.org";
const NEWSCATCHER_BASE_URL: &str = "https://api.newscatcherapi.com";

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Articles about `topic` published inside `window`, in the provider's ranking order.
    ///
    /// A non-success HTTP status degrades to an empty list. Transport failures are
    /// `ProviderUnavailable`.
    async fn fetch_news(&self, topic: &str, window: NewsWindow) -> Result<Vec<NewsArticle>>;
}

pub fn provider_from_settings(settings: &Settings) -> Result<Arc<dyn NewsProvider>> {
    match settings.news_provider.as_deref().unwrap_or("newsapi") {
        "newsapi" => Ok(Arc::new(NewsApiClient::from_settings(settings)?)),
        "newscatcher" => Ok(Arc::new(NewsCatcherClient::from_settings(settings)?)),
        other => anyhow::bail!("unsupported NEWS_PROVIDER: {other}"),
    }
}

/// newsapi.org `/v2/everything`, sorted by popularity.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings.provider_timeout_secs)?,
            base_url: settings
                .news_base_url
                .clone()
                .unwrap_or_else(|| NEWSAPI_BASE_URL.to_string()),
            api_key: settings.require_news_api_key()?.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v2/everything", self.base_url.trim_end_matches('/'))
    }

    fn query(topic: &str, from: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("q", topic.to_string()),
            ("from", from.format("%Y-%m-%d").to_string()),
            ("sortBy", "popularity".to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_news(&self, topic: &str, window: NewsWindow) -> Result<Vec<NewsArticle>> {
        let from = window.from_date(Utc::now());
        let req = self
            .http
            .get(self.url())
            .headers(api_key_headers(self.provider_name(), &self.api_key)?)
            .query(&Self::query(topic, from));

        let Some(parsed) =
            get_degradable::<NewsApiResponse>(self.provider_name(), topic, req).await?
        else {
            return Ok(Vec::new());
        };

        let articles = parsed.into_articles();
        tracing::info!(topic, %from, count = articles.len(), "fetched news");
        Ok(articles)
    }
}

/// newscatcherapi.com `/v2/search`, English only, sorted by relevancy.
#[derive(Debug, Clone)]
pub struct NewsCatcherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsCatcherClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings.provider_timeout_secs)?,
            base_url: settings
                .news_base_url
                .clone()
                .unwrap_or_else(|| NEWSCATCHER_BASE_URL.to_string()),
            api_key: settings.require_news_api_key()?.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v2/search", self.base_url.trim_end_matches('/'))
    }

    fn query(topic: &str, from: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("q", topic.to_string()),
            ("lang", "en".to_string()),
            ("from", from.format("%Y/%m/%d").to_string()),
            ("sort_by", "relevancy".to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsCatcherClient {
    fn provider_name(&self) -> &'static str {
        "newscatcher"
    }

    async fn fetch_news(&self, topic: &str, window: NewsWindow) -> Result<Vec<NewsArticle>> {
        let from = window.from_date(Utc::now());
        let req = self
            .http
            .get(self.url())
            .headers(api_key_headers(self.provider_name(), &self.api_key)?)
            .query(&Self::query(topic, from));

        let Some(parsed) =
            get_degradable::<NewsCatcherResponse>(self.provider_name(), topic, req).await?
        else {
            return Ok(Vec::new());
        };

        let articles = parsed.into_articles();
        tracing::info!(topic, %from, count = articles.len(), "fetched news");
        Ok(articles)
    }
}

fn api_key_headers(provider: &'static str, api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(api_key).map_err(|_| {
        ProviderUnavailable::new(Stage::News, provider, "api key is not a valid header value")
    })?;
    headers.insert("x-api-key", value);
    Ok(headers)
}

/// Sends `req`. `Ok(None)` means the provider answered with a non-success status.
async fn get_degradable<T: DeserializeOwned>(
    provider: &'static str,
    topic: &str,
    req: reqwest::RequestBuilder,
) -> Result<Option<T>> {
    let unavailable = |detail: String| ProviderUnavailable::new(Stage::News, provider, detail);

    let res = req
        .send()
        .await
        .map_err(|e| unavailable(format!("request failed: {e}")))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| unavailable(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        tracing::warn!(
            provider,
            topic,
            %status,
            body = %text,
            "news provider returned non-success; continuing without news"
        );
        return Ok(None);
    }

    let parsed = serde_json::from_str::<T>(&text)
        .map_err(|e| unavailable(format!("response is not the expected JSON: {e}")))?;
    Ok(Some(parsed))
}
