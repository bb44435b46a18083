use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Hold,
    Sell,
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "Buy",
            Action::Hold => "Hold",
            Action::Sell => "Sell",
            Action::Unknown => "Unknown",
        }
    }

    /// Matches a single word against the action vocabulary, ignoring ASCII case.
    /// `Unknown` is never produced here; it is the classifier's fallback.
    pub fn from_token(token: &str) -> Option<Self> {
        [Action::Buy, Action::Hold, Action::Sell]
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    /// Verbatim model response.
    pub rationale: String,
}
