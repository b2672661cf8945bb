use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use thiserror::Error;
use tokio::sync::RwLock;

use duebell_models::reminder::{OwnerId, Reminder, ReminderScheduledAt};

use crate::reminder::{ReminderStorage, ReminderStream};

#[derive(Debug, Error)]
pub enum InMemoryReminderError {
    #[error("Reminder does not exist [owner_id = {owner_id}, scheduled_at = {scheduled_at}]")]
    NotFound {
        owner_id: OwnerId,
        scheduled_at: ReminderScheduledAt,
    },
}

type ReminderKey = (OwnerId, ReminderScheduledAt);

#[derive(Default)]
pub struct InMemoryReminderStorage {
    store: RwLock<BTreeMap<ReminderKey, Reminder>>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let store = reminders
            .into_iter()
            .map(|reminder| (key_of(&reminder), reminder))
            .collect();

        Self {
            store: RwLock::new(store),
        }
    }

    /// Inserts or replaces the reminder with the same key.
    pub async fn insert(&self, reminder: Reminder) {
        self.store.write().await.insert(key_of(&reminder), reminder);
    }

    pub async fn get(&self, owner_id: &str, scheduled_at: &ReminderScheduledAt) -> Option<Reminder> {
        self.store
            .read()
            .await
            .get(&(owner_id.to_owned(), scheduled_at.clone()))
            .cloned()
    }

    async fn due_snapshot(&self, now: ReminderScheduledAt) -> Vec<Reminder> {
        self.store
            .read()
            .await
            .values()
            .filter(|reminder| reminder.is_due(&now))
            .cloned()
            .collect()
    }
}

fn key_of(reminder: &Reminder) -> ReminderKey {
    (reminder.owner_id.clone(), reminder.scheduled_at.clone())
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    type Error = InMemoryReminderError;

    fn fetch_due(&self, now: ReminderScheduledAt) -> ReminderStream<'_, Self::Error> {
        stream::once(self.due_snapshot(now))
            .flat_map(stream::iter)
            .map(Ok::<_, InMemoryReminderError>)
            .boxed()
    }

    async fn acknowledge(
        &self,
        owner_id: &str,
        scheduled_at: &ReminderScheduledAt,
    ) -> Result<(), Self::Error> {
        let mut store = self.store.write().await;
        match store.get_mut(&(owner_id.to_owned(), scheduled_at.clone())) {
            Some(reminder) => {
                reminder.sent = true;
                Ok(())
            }
            None => Err(InMemoryReminderError::NotFound {
                owner_id: owner_id.to_owned(),
                scheduled_at: scheduled_at.clone(),
            }),
        }
    }
}
