use duebell_models::reminder::{Reminder, ReminderScheduledAt};

#[derive(sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub owner_id: String,
    pub scheduled_at: String,
    pub message_body: String,
    pub sent: bool,
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = duebell_models::chrono::ParseError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            scheduled_at: value.scheduled_at.parse::<ReminderScheduledAt>()?,
            owner_id: value.owner_id,
            message_body: value.message_body,
            sent: value.sent,
        })
    }
}

pub fn decode_reminder(model: ReminderStorageModel) -> Option<Reminder> {
    let owner_id = model.owner_id.clone();
    let scheduled_at = model.scheduled_at.clone();

    match Reminder::try_from(model) {
        Ok(reminder) => Some(reminder),
        Err(err) => {
            log::warn!(
                "Skipping reminder with unreadable scheduled time. [owner_id = {}, scheduled_at = {}, error = {}]",
                owner_id,
                scheduled_at,
                err
            );
            None
        }
    }
}
