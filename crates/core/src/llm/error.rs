use crate::llm::Provider;
use std::fmt;

/// The completion call failed outright.
#[derive(Debug, Clone)]
pub struct InferenceUnavailable {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl InferenceUnavailable {
    pub fn new(provider: Provider, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw_output: impl Into<String>) -> Self {
        self.raw_output = Some(raw_output.into());
        self
    }
}

impl fmt::Display for InferenceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inference unavailable (provider={}, stage={}): {}",
            self.provider.name(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for InferenceUnavailable {}
