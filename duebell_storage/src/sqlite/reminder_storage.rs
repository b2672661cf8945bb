mod model;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use model::{ReminderStorageModel, decode_reminder};
use thiserror::Error;

use duebell_models::reminder::{OwnerId, Reminder, ReminderScheduledAt};

use crate::reminder::{ReminderStorage, ReminderStream};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

// Stored keys may carry fractional seconds or a UTC offset, so the due filter
// compares instants rather than text.
const FIRST_DUE_PAGE: &str = "
SELECT owner_id, scheduled_at, message_body, sent
FROM reminders
WHERE julianday(scheduled_at) <= julianday(?) AND sent = 0
ORDER BY owner_id, scheduled_at
LIMIT ?
";

const NEXT_DUE_PAGE: &str = "
SELECT owner_id, scheduled_at, message_body, sent
FROM reminders
WHERE julianday(scheduled_at) <= julianday(?) AND sent = 0
  AND (owner_id, scheduled_at) > (?, ?)
ORDER BY owner_id, scheduled_at
LIMIT ?
";

const MARK_SENT: &str = "
UPDATE reminders
SET sent = 1
WHERE owner_id = ? AND scheduled_at = ?
";

#[derive(Debug, Error)]
pub enum SqliteReminderError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Reminder does not exist [owner_id = {owner_id}, scheduled_at = {scheduled_at}]")]
    NotFound {
        owner_id: OwnerId,
        scheduled_at: ReminderScheduledAt,
    },
}

/// Primary key of the last row of a page; the next page starts strictly after it.
struct ScanCursor {
    owner_id: String,
    scheduled_at: String,
}

enum ScanPosition {
    Start,
    After(ScanCursor),
    Exhausted,
}

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
    page_size: u32,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn next_due_page(
        &self,
        now: &str,
        position: ScanPosition,
    ) -> Result<Option<(Vec<ReminderStorageModel>, ScanPosition)>, SqliteReminderError> {
        let limit = i64::from(self.page_size);
        let page = match position {
            ScanPosition::Exhausted => return Ok(None),
            ScanPosition::Start => {
                sqlx::query_as::<_, ReminderStorageModel>(FIRST_DUE_PAGE)
                    .bind(now)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            ScanPosition::After(cursor) => {
                sqlx::query_as::<_, ReminderStorageModel>(NEXT_DUE_PAGE)
                    .bind(now)
                    .bind(cursor.owner_id)
                    .bind(cursor.scheduled_at)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        log::debug!("Fetched page of due reminders. [rows = {}, now = {}]", page.len(), now);

        let next = match page.last() {
            Some(last) if page.len() >= self.page_size as usize => ScanPosition::After(ScanCursor {
                owner_id: last.owner_id.clone(),
                scheduled_at: last.scheduled_at.clone(),
            }),
            _ => ScanPosition::Exhausted,
        };

        Ok(Some((page, next)))
    }
}

fn still_due(reminder: &Reminder, now: &ReminderScheduledAt) -> bool {
    if reminder.is_due(now) {
        return true;
    }

    log::warn!(
        "Skipping reminder the store reported as due. [owner_id = {}, scheduled_at = {}, now = {}]",
        reminder.owner_id,
        reminder.scheduled_at,
        now
    );
    false
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    type Error = SqliteReminderError;

    fn fetch_due(&self, now: ReminderScheduledAt) -> ReminderStream<'_, Self::Error> {
        let now_key = now.key().to_owned();

        stream::try_unfold(ScanPosition::Start, move |position| {
            let now_key = now_key.clone();
            async move { self.next_due_page(&now_key, position).await }
        })
        .map_ok(move |page| {
            let due: Vec<_> = page
                .into_iter()
                .filter_map(decode_reminder)
                .filter(|reminder| still_due(reminder, &now))
                .map(Ok::<_, SqliteReminderError>)
                .collect();
            stream::iter(due)
        })
        .try_flatten()
        .boxed()
    }

    async fn acknowledge(
        &self,
        owner_id: &str,
        scheduled_at: &ReminderScheduledAt,
    ) -> Result<(), Self::Error> {
        let result = sqlx::query(MARK_SENT)
            .bind(owner_id)
            .bind(scheduled_at.key())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SqliteReminderError::NotFound {
                owner_id: owner_id.to_owned(),
                scheduled_at: scheduled_at.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
