use duebell_models::{
    chrono::{DateTime, Duration, TimeZone, Utc},
    reminder::Reminder,
};
use futures::TryStreamExt;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use super::*;
use crate::sqlite::migrate;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

async fn test_pool() -> SqlitePool {
    // An in-memory database lives only as long as its connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}

async fn seed(pool: &SqlitePool, owner_id: &str, scheduled_at: &str, sent: bool) {
    sqlx::query(
        "INSERT INTO reminders (owner_id, scheduled_at, message_body, sent) VALUES (?, ?, ?, ?)",
    )
    .bind(owner_id)
    .bind(scheduled_at)
    .bind(format!("{owner_id}'s reminder"))
    .bind(sent)
    .execute(pool)
    .await
    .unwrap();
}

async fn is_sent(pool: &SqlitePool, owner_id: &str, scheduled_at: &str) -> bool {
    sqlx::query_scalar("SELECT sent FROM reminders WHERE owner_id = ? AND scheduled_at = ?")
        .bind(owner_id)
        .bind(scheduled_at)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn key(at: DateTime<Utc>) -> String {
    ReminderScheduledAt::new(at).key().to_owned()
}

#[tokio::test]
async fn fetch_due_filters_sent_and_future_reminders() {
    let pool = test_pool().await;
    seed(&pool, "a", &key(now() - Duration::hours(1)), false).await;
    seed(&pool, "b", &key(now() + Duration::hours(1)), false).await;
    seed(&pool, "c", &key(now() - Duration::hours(1)), true).await;
    seed(&pool, "d", &key(now()), false).await;
    let storage = SqliteReminderStorage::new(pool);

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    let owners: Vec<&str> = due.iter().map(|r| r.owner_id.as_str()).collect();

    assert_eq!(owners, vec!["a", "d"]);
    assert_eq!(due[0].message_body, "a's reminder");
    assert_eq!(
        due[0].scheduled_at,
        ReminderScheduledAt::new(now() - Duration::hours(1))
    );
    assert!(due.iter().all(|r| !r.sent));
}

#[tokio::test]
async fn acknowledge_marks_only_the_keyed_reminder() {
    let pool = test_pool().await;
    let at = key(now() - Duration::minutes(10));
    seed(&pool, "a", &at, false).await;
    seed(&pool, "a", &key(now() - Duration::minutes(5)), false).await;
    seed(&pool, "b", &at, false).await;
    let storage = SqliteReminderStorage::new(pool.clone());

    storage
        .acknowledge("a", &(now() - Duration::minutes(10)).into())
        .await
        .unwrap();

    assert!(is_sent(&pool, "a", &at).await);
    assert!(!is_sent(&pool, "a", &key(now() - Duration::minutes(5))).await);
    assert!(!is_sent(&pool, "b", &at).await);

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    assert_eq!(due.len(), 2);
}

#[tokio::test]
async fn acknowledge_is_idempotent() {
    let pool = test_pool().await;
    seed(&pool, "a", &key(now()), false).await;
    let storage = SqliteReminderStorage::new(pool.clone());

    storage.acknowledge("a", &now().into()).await.unwrap();
    storage.acknowledge("a", &now().into()).await.unwrap();

    assert!(is_sent(&pool, "a", &key(now())).await);
}

#[tokio::test]
async fn acknowledge_unknown_key_is_not_found() {
    let pool = test_pool().await;
    seed(&pool, "a", &key(now()), false).await;
    let storage = SqliteReminderStorage::new(pool);

    let result = storage.acknowledge("b", &now().into()).await;

    assert!(matches!(result, Err(SqliteReminderError::NotFound { .. })));
}

#[tokio::test]
async fn fetch_due_pages_through_every_due_reminder() {
    let pool = test_pool().await;
    for owner in ["a", "b", "c", "d", "e"] {
        seed(&pool, owner, &key(now() - Duration::minutes(1)), false).await;
        seed(&pool, owner, &key(now() + Duration::minutes(1)), false).await;
    }
    let storage = SqliteReminderStorage::new(pool).with_page_size(2);

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    let owners: Vec<&str> = due.iter().map(|r| r.owner_id.as_str()).collect();

    assert_eq!(owners, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn acknowledging_while_paging_does_not_skip_reminders() {
    let pool = test_pool().await;
    for owner in ["a", "b", "c", "d", "e"] {
        seed(&pool, owner, &key(now() - Duration::minutes(1)), false).await;
    }
    let storage = SqliteReminderStorage::new(pool.clone()).with_page_size(2);

    let mut seen = Vec::new();
    let mut due = storage.fetch_due(now().into());
    while let Some(reminder) = due.try_next().await.unwrap() {
        storage
            .acknowledge(&reminder.owner_id, &reminder.scheduled_at)
            .await
            .unwrap();
        seen.push(reminder.owner_id);
    }

    assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    let remaining: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn unreadable_rows_are_skipped() {
    let pool = test_pool().await;
    seed(&pool, "a", "2020-01-01 garbage", false).await;
    seed(&pool, "b", &key(now() - Duration::minutes(1)), false).await;
    let storage = SqliteReminderStorage::new(pool);

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].owner_id, "b");
}

#[tokio::test]
async fn fractional_second_key_round_trips_through_acknowledge() {
    let pool = test_pool().await;
    seed(&pool, "a", "2025-03-01T08:59:00.250Z", false).await;
    let storage = SqliteReminderStorage::new(pool.clone());

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].scheduled_at.key(), "2025-03-01T08:59:00.250Z");

    storage
        .acknowledge(&due[0].owner_id, &due[0].scheduled_at)
        .await
        .unwrap();

    assert!(is_sent(&pool, "a", "2025-03-01T08:59:00.250Z").await);
    let due: Vec<Reminder> = storage
        .fetch_due((now() + Duration::hours(1)).into())
        .try_collect()
        .await
        .unwrap();
    assert!(due.is_empty());
}

#[tokio::test]
async fn offset_keys_are_compared_as_instants() {
    let pool = test_pool().await;
    // 13:00Z, sorts before "2025-03-01T09:00:00Z" as text
    seed(&pool, "later", "2025-03-01T08:00:00-05:00", false).await;
    // 08:00Z, sorts after it as text
    seed(&pool, "earlier", "2025-03-01T10:00:00+02:00", false).await;
    let storage = SqliteReminderStorage::new(pool.clone());

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    let owners: Vec<&str> = due.iter().map(|r| r.owner_id.as_str()).collect();
    assert_eq!(owners, vec!["earlier"]);

    storage
        .acknowledge(&due[0].owner_id, &due[0].scheduled_at)
        .await
        .unwrap();
    assert!(is_sent(&pool, "earlier", "2025-03-01T10:00:00+02:00").await);

    let due: Vec<Reminder> = storage
        .fetch_due((now() + Duration::hours(4)).into())
        .try_collect()
        .await
        .unwrap();
    let owners: Vec<&str> = due.iter().map(|r| r.owner_id.as_str()).collect();
    assert_eq!(owners, vec!["later"]);
}

#[tokio::test]
async fn sub_second_reminder_is_not_due_before_its_instant() {
    let pool = test_pool().await;
    seed(&pool, "a", "2025-03-01T09:00:00.500Z", false).await;
    let storage = SqliteReminderStorage::new(pool);

    let due: Vec<Reminder> = storage.fetch_due(now().into()).try_collect().await.unwrap();
    assert!(due.is_empty());

    let due: Vec<Reminder> = storage
        .fetch_due((now() + Duration::seconds(1)).into())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
}
