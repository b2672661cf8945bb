mod cycle;
mod delivery;

pub use cycle::{CycleError, CycleReport, ReminderCycle, ReminderOutcome};
pub use delivery::ReminderDeliveryChannel;
