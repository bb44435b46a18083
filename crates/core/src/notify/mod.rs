pub mod format;
pub mod twilio;

use crate::domain::notification::NotificationMessage;

/// Outbound messaging channel. One best-effort send, no retry, no idempotency key.
#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn channel_name(&self) -> &'static str;

    /// Sends `message` to its recipient and returns the provider-assigned delivery id.
    async fn deliver(&self, message: &NotificationMessage) -> anyhow::Result<String>;
}
