pub mod reminder_storage;

pub use sqlx;

pub use reminder_storage::{SqliteReminderError, SqliteReminderStorage};

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
