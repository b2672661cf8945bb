use async_trait::async_trait;

use duebell_models::reminder::Reminder;

/// Outbound channel reminders are published to. The destination is fixed when
/// the channel is built; implementations do not retry.
#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send_reminder_notification(&self, reminder: &Reminder) -> Result<(), Self::Error>;
}
