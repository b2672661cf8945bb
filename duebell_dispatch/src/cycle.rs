use std::{fmt, sync::Arc};

use duebell_models::{
    chrono::{DateTime, Utc},
    reminder::{Reminder, ReminderScheduledAt},
};
use duebell_storage::ReminderStorage;
use futures::StreamExt;
use thiserror::Error;

use crate::delivery::ReminderDeliveryChannel;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Failed to fetch due reminders after {attempted} dispatch attempt(s): {source}")]
    Fetch {
        attempted: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// What happened to a single due reminder during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    Acknowledged,
    DispatchFailed,
    /// Dispatched but still pending in the store; the next cycle sends it again.
    AcknowledgeFailed,
}

/// Tally of one cycle. Only `attempted` is reported to the invoker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub attempted: usize,
    pub acknowledged: usize,
    pub dispatch_failures: usize,
    pub acknowledge_failures: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: ReminderOutcome) {
        self.attempted += 1;
        match outcome {
            ReminderOutcome::Acknowledged => self.acknowledged += 1,
            ReminderOutcome::DispatchFailed => self.dispatch_failures += 1,
            ReminderOutcome::AcknowledgeFailed => self.acknowledge_failures += 1,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attempted {
            1 => write!(f, "Processed 1 reminder."),
            n => write!(f, "Processed {n} reminders."),
        }
    }
}

pub struct ReminderCycle<S, D> {
    storage: Arc<S>,
    delivery: Arc<D>,
}

impl<S, D> ReminderCycle<S, D>
where
    S: ReminderStorage,
    D: ReminderDeliveryChannel,
{
    pub fn new(storage: Arc<S>, delivery: Arc<D>) -> Self {
        Self { storage, delivery }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// One pass over everything due at `now`. `now` is taken once and used for
    /// the whole pass.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let now = ReminderScheduledAt::new(now);
        log::info!("Starting reminder cycle. [now = {}]", now);

        let mut report = CycleReport::default();
        let mut due = self.storage.fetch_due(now);

        while let Some(reminder) = due.next().await {
            let reminder = reminder.map_err(|err| CycleError::Fetch {
                attempted: report.attempted,
                source: Box::new(err),
            })?;

            let outcome = self.process_reminder(&reminder).await;
            report.record(outcome);
        }

        log::info!(
            "Finished reminder cycle. [attempted = {}, acknowledged = {}, dispatch_failures = {}, acknowledge_failures = {}]",
            report.attempted,
            report.acknowledged,
            report.dispatch_failures,
            report.acknowledge_failures
        );

        Ok(report)
    }

    async fn process_reminder(&self, reminder: &Reminder) -> ReminderOutcome {
        if let Err(err) = self.delivery.send_reminder_notification(reminder).await {
            log::warn!(
                "Failed to dispatch reminder, leaving it pending. [owner_id = {}, scheduled_at = {}, error = {}]",
                reminder.owner_id,
                reminder.scheduled_at,
                err
            );
            return ReminderOutcome::DispatchFailed;
        }

        match self
            .storage
            .acknowledge(&reminder.owner_id, &reminder.scheduled_at)
            .await
        {
            Ok(()) => {
                log::info!(
                    "Sent reminder. [owner_id = {}, scheduled_at = {}]",
                    reminder.owner_id,
                    reminder.scheduled_at
                );
                ReminderOutcome::Acknowledged
            }
            Err(err) => {
                log::error!(
                    "Reminder was dispatched but could not be marked as sent, it will be dispatched again next cycle. [owner_id = {}, scheduled_at = {}, error = {}]",
                    reminder.owner_id,
                    reminder.scheduled_at,
                    err
                );
                ReminderOutcome::AcknowledgeFailed
            }
        }
    }
}
