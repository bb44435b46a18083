use crate::llm::error::InferenceUnavailable;
use serde::Serialize;
use std::fmt;

/// Pipeline stage that talks to an external provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    News,
    Financials,
    Inference,
    Delivery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::News => "news",
            Stage::Financials => "financials",
            Stage::Inference => "inference",
            Stage::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data or messaging provider could not be reached or answered with something unusable.
#[derive(Debug, Clone)]
pub struct ProviderUnavailable {
    pub stage: Stage,
    pub provider: &'static str,
    pub detail: String,
}

impl ProviderUnavailable {
    pub fn new(stage: Stage, provider: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            provider,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ProviderUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider unavailable (stage={}, provider={}): {}",
            self.stage, self.provider, self.detail
        )
    }
}

impl std::error::Error for ProviderUnavailable {}

#[derive(Debug, Clone)]
pub struct InvalidInput(pub String);

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: {}", self.0)
    }
}

impl std::error::Error for InvalidInput {}

/// Notification was requested but no messaging channel is configured.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryNotConfigured;

impl fmt::Display for DeliveryNotConfigured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("notification delivery is not configured")
    }
}

impl std::error::Error for DeliveryNotConfigured {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Upstream(Stage),
    NotConfigured,
    Internal,
}

/// Maps a pipeline error onto the taxonomy the edges (HTTP, CLI) report.
pub fn classify(err: &anyhow::Error) -> FailureKind {
    if err.downcast_ref::<InvalidInput>().is_some() {
        FailureKind::InvalidInput
    } else if let Some(e) = err.downcast_ref::<ProviderUnavailable>() {
        FailureKind::Upstream(e.stage)
    } else if err.downcast_ref::<InferenceUnavailable>().is_some() {
        FailureKind::Upstream(Stage::Inference)
    } else if err.downcast_ref::<DeliveryNotConfigured>().is_some() {
        FailureKind::NotConfigured
    } else {
        FailureKind::Internal
    }
}

/// What the model provider actually sent back when inference failed, for logging only.
pub fn raw_model_output(err: &anyhow::Error) -> Option<&str> {
    err.downcast_ref::<InferenceUnavailable>()?
        .raw_output
        .as_deref()
}
