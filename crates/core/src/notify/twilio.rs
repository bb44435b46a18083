use crate::config::Settings;
use crate::domain::notification::NotificationMessage;
use crate::error::{ProviderUnavailable, Stage};
use crate::notify::DeliveryChannel;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// WhatsApp/SMS delivery through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                settings.provider_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .context("failed to build twilio http client")?;

        Ok(Self {
            http,
            base_url: settings
                .twilio_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            account_sid: settings.require_twilio_account_sid()?.to_string(),
            auth_token: settings.require_twilio_auth_token()?.to_string(),
            from: settings.require_twilio_whatsapp_number()?.to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    fn form<'a>(&'a self, message: &'a NotificationMessage) -> [(&'static str, &'a str); 3] {
        [
            ("From", self.from.as_str()),
            ("To", message.recipient.as_str()),
            ("Body", message.body.as_str()),
        ]
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for TwilioClient {
    fn channel_name(&self) -> &'static str {
        "twilio"
    }

    async fn deliver(&self, message: &NotificationMessage) -> anyhow::Result<String> {
        let channel = self.channel_name();
        let unavailable =
            |detail: String| ProviderUnavailable::new(Stage::Delivery, channel, detail);

        let res = self
            .http
            .post(self.url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form(message))
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

        let sid = parse_message_sid(&text).map_err(unavailable)?;
        tracing::info!(symbol = %message.symbol, %sid, "notification delivered");
        Ok(sid)
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    #[serde(default)]
    sid: Option<String>,
}

fn parse_message_sid(text: &str) -> Result<String, String> {
    let resource = serde_json::from_str::<MessageResource>(text)
        .map_err(|e| format!("response is not a message resource: {e}"))?;
    resource
        .sid
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "message resource has no sid".to_string())
}
