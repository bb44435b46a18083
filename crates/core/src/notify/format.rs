use crate::domain::news::NewsArticle;
use crate::domain::notification::NotificationMessage;
use crate::domain::recommendation::Recommendation;
use crate::domain::symbol::Symbol;

pub const HEADLINE_DIGEST_LIMIT: usize = 3;
pub const HEADLINE_MARKER: &str = "📰";
pub const NO_HEADLINES: &str = "No news";

/// First three article titles, independent of how many fed the prompt.
pub fn headline_digest(articles: &[NewsArticle]) -> Vec<String> {
    articles
        .iter()
        .take(HEADLINE_DIGEST_LIMIT)
        .map(|a| a.title.clone())
        .collect()
}

pub fn format_notification(
    symbol: &Symbol,
    recommendation: &Recommendation,
    articles: &[NewsArticle],
    recipient: &str,
) -> NotificationMessage {
    let headline_digest = headline_digest(articles);
    let body = render_body(symbol, recommendation, &headline_digest);
    NotificationMessage {
        symbol: symbol.clone(),
        recommendation: recommendation.clone(),
        headline_digest,
        recipient: recipient.to_string(),
        body,
    }
}

fn render_body(symbol: &Symbol, recommendation: &Recommendation, digest: &[String]) -> String {
    let headlines = if digest.is_empty() {
        NO_HEADLINES.to_string()
    } else {
        digest
            .iter()
            .map(|title| format!("{HEADLINE_MARKER} {title}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "📊 Stock Advisor Update\n\n\
         📌 *{symbol}*: {action}\n\n\
         🧠 *AI Suggestion:*\n\
         {rationale}\n\n\
         {headlines}\n\n\
         🔁 More updates soon.",
        action = recommendation.action,
        rationale = recommendation.rationale,
    )
}
