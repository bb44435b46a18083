//! Wire shapes of the upstream news search APIs.

use crate::domain::news::NewsArticle;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

// newsapi.org replaces takedowns with this placeholder title.
const REMOVED_TITLE: &str = "[Removed]";

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "totalResults")]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<NewsApiSource>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub name: Option<String>,
}

impl NewsApiResponse {
    pub fn into_articles(self) -> Vec<NewsArticle> {
        self.articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .collect()
    }
}

impl NewsApiArticle {
    fn into_article(self) -> Option<NewsArticle> {
        let title = clean_title(self.title)?;
        Some(NewsArticle {
            title,
            source: self.source.and_then(|s| s.name),
            published_at: self.published_at.as_deref().and_then(parse_rfc3339),
            description: self.description,
            url: self.url,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsCatcherResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub articles: Vec<NewsCatcherArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsCatcherArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub clean_url: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl NewsCatcherResponse {
    pub fn into_articles(self) -> Vec<NewsArticle> {
        self.articles
            .into_iter()
            .filter_map(NewsCatcherArticle::into_article)
            .collect()
    }
}

impl NewsCatcherArticle {
    fn into_article(self) -> Option<NewsArticle> {
        let title = clean_title(self.title)?;
        Some(NewsArticle {
            title,
            source: self.clean_url,
            published_at: self.published_date.as_deref().and_then(parse_naive_utc),
            description: self.excerpt,
            url: self.link,
        })
    }
}

fn clean_title(title: Option<String>) -> Option<String> {
    let title = title?.trim().to_string();
    if title.is_empty() || title == REMOVED_TITLE {
        return None;
    }
    Some(title)
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

// NewsCatcher sends "YYYY-MM-DD HH:MM:SS" in UTC.
fn parse_naive_utc(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|d| d.and_utc())
}
