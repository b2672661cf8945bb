mod appsettings;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use appsettings::AppSettings;
use duebell_dispatch::{ReminderCycle, ReminderDeliveryChannel};
use duebell_storage::{
    ReminderStorage,
    sqlite::{self, SqliteReminderStorage, sqlx::sqlite::SqlitePoolOptions},
};
use duebell_telegram::{
    TelegramDeliveryChannel,
    teloxide::{Bot, types::ChatId},
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new().context("Failed to load application settings")?;

    let pool = SqlitePoolOptions::new()
        .connect(&settings.storage.database_url)
        .await
        .context("Failed to connect to the reminder database")?;
    sqlite::migrate(&pool)
        .await
        .context("Failed to apply database migrations")?;

    let storage = SqliteReminderStorage::new(pool).with_page_size(settings.storage.page_size);
    let delivery = TelegramDeliveryChannel::new(
        Bot::new(settings.telegram.token.clone()),
        ChatId(settings.telegram.channel_id),
    );
    let cycle = ReminderCycle::new(Arc::new(storage), Arc::new(delivery));

    match settings.schedule.interval() {
        None => {
            let report = cycle.run_cycle().await?;
            println!("{report}");
        }
        Some(period) => run_periodically(&cycle, period).await,
    }

    Ok(())
}

async fn run_periodically<S, D>(cycle: &ReminderCycle<S, D>, period: Duration)
where
    S: ReminderStorage,
    D: ReminderDeliveryChannel,
{
    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    log::info!("Running reminder cycles. [period = {:?}]", period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::info!("Stopping reminder cycles.");
                break;
            }
            _ = interval.tick() => {
                // A started cycle is never interrupted.
                match cycle.run_cycle().await {
                    Ok(report) => log::info!("{}", report),
                    Err(err) => log::error!("Reminder cycle failed. [error = {}]", err),
                }
            }
        }
    }
}
