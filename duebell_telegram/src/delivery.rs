use async_trait::async_trait;
use duebell_dispatch::ReminderDeliveryChannel;
use duebell_models::reminder::Reminder;
use teloxide::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramDeliveryChannelError {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),
}

/// Publishes reminders to a single Telegram channel or group. Whoever is
/// subscribed to that chat receives them.
pub struct TelegramDeliveryChannel {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramDeliveryChannel {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReminderDeliveryChannel for TelegramDeliveryChannel {
    type Error = TelegramDeliveryChannelError;

    async fn send_reminder_notification(&self, reminder: &Reminder) -> Result<(), Self::Error> {
        // Plain text: message bodies are user-written and not escaped for markup.
        self.bot
            .send_message(self.chat_id, get_message_text(reminder))
            .await?;

        Ok(())
    }
}

pub fn get_message_text(reminder: &Reminder) -> String {
    format!(
        "Hi {},\n\nThis is your reminder:\n{}\n\nScheduled at: {}",
        reminder.owner_id, reminder.message_body, reminder.scheduled_at
    )
}
