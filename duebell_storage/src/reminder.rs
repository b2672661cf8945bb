use async_trait::async_trait;
use futures::stream::BoxStream;

use duebell_models::reminder::{Reminder, ReminderScheduledAt};

/// Forward-only, one-shot sequence of due reminders. Pages are pulled from the
/// backing store as the consumer advances.
pub type ReminderStream<'a, E> = BoxStream<'a, Result<Reminder, E>>;

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every reminder with `scheduled_at <= now` that has not been sent yet.
    ///
    /// Calling this again re-queries and may observe a different snapshot.
    fn fetch_due(&self, now: ReminderScheduledAt) -> ReminderStream<'_, Self::Error>;

    /// Marks exactly the reminder keyed by `(owner_id, scheduled_at)` as sent.
    async fn acknowledge(
        &self,
        owner_id: &str,
        scheduled_at: &ReminderScheduledAt,
    ) -> Result<(), Self::Error>;
}
