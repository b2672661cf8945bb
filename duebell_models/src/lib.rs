pub mod reminder;

pub use chrono;
