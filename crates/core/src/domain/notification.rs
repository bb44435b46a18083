use crate::domain::recommendation::Recommendation;
use crate::domain::symbol::Symbol;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub symbol: Symbol,
    pub recommendation: Recommendation,
    /// At most three article titles.
    pub headline_digest: Vec<String>,
    pub recipient: String,
    pub body: String,
}
