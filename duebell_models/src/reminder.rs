use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub type OwnerId = String;

/// Point in time a reminder is scheduled for, together with the exact text the
/// record store keys it by.
///
/// Values built from a `DateTime` are truncated to whole seconds and keyed as
/// `2025-03-01T09:00:00Z`. Values parsed from stored text keep that text
/// verbatim as their key, so a point update finds the same record the read
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderScheduledAt {
    instant: DateTime<Utc>,
    key: String,
}

impl ReminderScheduledAt {
    pub fn new(inner: DateTime<Utc>) -> Self {
        let instant = inner.trunc_subsecs(0);
        Self {
            key: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            instant,
        }
    }

    pub fn datetime(&self) -> &DateTime<Utc> {
        &self.instant
    }

    pub fn into_datetime(self) -> DateTime<Utc> {
        self.instant
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ReminderScheduledAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for ReminderScheduledAt {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s)?;
        Ok(Self {
            instant: parsed.with_timezone(&Utc),
            key: s.to_owned(),
        })
    }
}

impl From<DateTime<Utc>> for ReminderScheduledAt {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub owner_id: OwnerId,
    pub scheduled_at: ReminderScheduledAt,
    pub message_body: String,
    pub sent: bool,
}

impl Reminder {
    /// A reminder is due once its scheduled time has passed and it was never sent.
    pub fn is_due(&self, now: &ReminderScheduledAt) -> bool {
        !self.sent && self.scheduled_at.datetime() <= now.datetime()
    }
}
