pub mod domain;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod time;

#[cfg(test)]
mod testing;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub news_provider: Option<String>,
        pub news_api_key: Option<String>,
        pub news_base_url: Option<String>,
        pub news_window_hours: Option<i64>,
        pub fin_api_key: Option<String>,
        pub fin_base_url: Option<String>,
        pub provider_timeout_secs: Option<u64>,

        pub llm_provider: Option<String>,
        pub openai_api_key: Option<String>,
        pub openai_base_url: Option<String>,
        pub openai_model: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub anthropic_model: Option<String>,
        pub llm_temperature: Option<f32>,
        pub llm_max_tokens: Option<u32>,
        pub llm_timeout_secs: Option<u64>,

        pub twilio_account_sid: Option<String>,
        pub twilio_auth_token: Option<String>,
        pub twilio_whatsapp_number: Option<String>,
        pub twilio_base_url: Option<String>,
        pub user_whatsapp_number: Option<String>,

        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup. Blank values count as unset.
        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let var = |key: &str| {
                lookup(key)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };

            Ok(Self {
                news_provider: var("NEWS_PROVIDER"),
                news_api_key: var("NEWS_API_KEY"),
                news_base_url: var("NEWS_BASE_URL"),
                news_window_hours: parse_var(var("NEWS_WINDOW_HOURS"), "NEWS_WINDOW_HOURS")?,
                fin_api_key: var("FIN_API_KEY"),
                fin_base_url: var("FIN_BASE_URL"),
                provider_timeout_secs: parse_var(
                    var("PROVIDER_TIMEOUT_SECS"),
                    "PROVIDER_TIMEOUT_SECS",
                )?,
                llm_provider: var("LLM_PROVIDER"),
                openai_api_key: var("OPENAI_API_KEY"),
                openai_base_url: var("OPENAI_BASE_URL"),
                openai_model: var("OPENAI_MODEL"),
                anthropic_api_key: var("ANTHROPIC_API_KEY"),
                anthropic_base_url: var("ANTHROPIC_BASE_URL"),
                anthropic_model: var("ANTHROPIC_MODEL"),
                llm_temperature: parse_var(var("LLM_TEMPERATURE"), "LLM_TEMPERATURE")?,
                llm_max_tokens: parse_var(var("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS")?,
                llm_timeout_secs: parse_var(var("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS")?,
                twilio_account_sid: var("TWILIO_ACCOUNT_SID"),
                twilio_auth_token: var("TWILIO_AUTH_TOKEN"),
                twilio_whatsapp_number: var("TWILIO_WHATSAPP_NUMBER"),
                twilio_base_url: var("TWILIO_BASE_URL"),
                user_whatsapp_number: var("USER_WHATSAPP_NUMBER"),
                sentry_dsn: var("SENTRY_DSN"),
                port: parse_var(var("PORT"), "PORT")?,
            })
        }

        pub fn require_news_api_key(&self) -> anyhow::Result<&str> {
            self.news_api_key
                .as_deref()
                .context("NEWS_API_KEY is required")
        }

        pub fn require_fin_api_key(&self) -> anyhow::Result<&str> {
            self.fin_api_key.as_deref().context("FIN_API_KEY is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_twilio_account_sid(&self) -> anyhow::Result<&str> {
            self.twilio_account_sid
                .as_deref()
                .context("TWILIO_ACCOUNT_SID is required")
        }

        pub fn require_twilio_auth_token(&self) -> anyhow::Result<&str> {
            self.twilio_auth_token
                .as_deref()
                .context("TWILIO_AUTH_TOKEN is required")
        }

        pub fn require_twilio_whatsapp_number(&self) -> anyhow::Result<&str> {
            self.twilio_whatsapp_number
                .as_deref()
                .context("TWILIO_WHATSAPP_NUMBER is required")
        }

        /// True when every credential needed for outbound messaging is present.
        pub fn delivery_configured(&self) -> bool {
            self.twilio_account_sid.is_some()
                && self.twilio_auth_token.is_some()
                && self.twilio_whatsapp_number.is_some()
        }
    }

    fn parse_var<T>(value: Option<String>, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        value
            .map(|s| s.parse::<T>().with_context(|| format!("{key} is invalid: {s}")))
            .transpose()
    }

}
