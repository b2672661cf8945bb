mod in_memory;
mod reminder;
pub mod sqlite;

pub use in_memory::{InMemoryReminderError, InMemoryReminderStorage};
pub use reminder::{ReminderStorage, ReminderStream};
