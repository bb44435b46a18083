use crate::domain::financials::FinancialSnapshot;
use crate::domain::news::NewsArticle;
use crate::domain::symbol::Symbol;

pub const MAX_PROMPT_ARTICLES: usize = 5;
pub const NO_NEWS_FALLBACK: &str = "No news found.";
pub const NO_FINANCIALS_FALLBACK: &str = "No financial data available.";

/// `- <title>` per article, first five only.
pub fn render_news_summary(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return NO_NEWS_FALLBACK.to_string();
    }
    articles
        .iter()
        .take(MAX_PROMPT_ARTICLES)
        .map(|a| format!("- {}", a.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `key: value` per truthy metric.
pub fn render_financials(financials: &FinancialSnapshot) -> String {
    let lines: Vec<String> = financials
        .truthy_entries()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    if lines.is_empty() {
        return NO_FINANCIALS_FALLBACK.to_string();
    }
    lines.join("\n")
}

pub fn build_prompt(
    symbol: &Symbol,
    articles: &[NewsArticle],
    financials: &FinancialSnapshot,
) -> String {
    [
        "You are a stock market analyst.".to_string(),
        String::new(),
        format!("Analyze the following company: {symbol}"),
        String::new(),
        "News Headlines:".to_string(),
        render_news_summary(articles),
        String::new(),
        "Financial Data:".to_string(),
        render_financials(financials),
        String::new(),
        "Answer the following:".to_string(),
        "1. Should the user Buy, Hold, or Sell this stock? \
         (Answer only one word: Buy / Hold / Sell)"
            .to_string(),
        "2. Is the company's financial health good or bad?".to_string(),
        "3. What is its future outlook?".to_string(),
        "4. Is the company competitive in its sector?".to_string(),
        "Give short, professional answers.".to_string(),
    ]
    .join("\n")
}
