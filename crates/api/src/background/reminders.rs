//! Reminder delivery and claim cleanup.
//!
//! Runs the [`ReminderScheduler`] poll loop against the PostgreSQL
//! idempotency store, plus an hourly purge of expired claims. Both stop
//! when `cancel` is triggered.

use std::sync::Arc;
use std::time::Duration;

use assessly_core::clock::SystemClock;
use assessly_core::notify::NotificationGateway;
use assessly_db::{DbPool, PgIdempotencyStore};
use assessly_scheduling::{ReminderScheduler, ReminderSettings};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How often expired reminder claims are deleted.
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the reminder scheduler and the claim purge loop.
pub fn spawn(
    pool: DbPool,
    notifier: Arc<dyn NotificationGateway>,
    settings: ReminderSettings,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let store = Arc::new(PgIdempotencyStore::new(pool.clone()));
    let scheduler = ReminderScheduler::new(
        pool,
        store.clone(),
        notifier,
        Arc::new(SystemClock),
        settings,
    );

    tokio::spawn(async move {
        tokio::join!(scheduler.run(cancel.clone()), purge_expired_claims(store, cancel));
    })
}

async fn purge_expired_claims(store: Arc<PgIdempotencyStore>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reminder claim purge stopping");
                break;
            }
            _ = interval.tick() => {
                match store.purge_expired().await {
                    Ok(0) => tracing::debug!("Reminder claim purge: nothing expired"),
                    Ok(purged) => tracing::info!(purged, "Reminder claim purge: removed expired claims"),
                    Err(e) => tracing::error!(error = %e, "Reminder claim purge failed"),
                }
            }
        }
    }
}
