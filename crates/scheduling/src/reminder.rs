//! Reminder scheduler.
//!
//! [`ReminderScheduler`] runs as a background task. Every poll it computes,
//! for each configured window, the range of slot start times that entered
//! that window within the retry lookback, and sends one reminder per
//! assigned interview in range. Each `(window, spot)` pair is claimed in the
//! idempotency store before sending, so overlapping polls and multiple
//! instances never send twice. A failed send releases its claim, and the
//! start stays in range on later polls until the lookback passes.

use std::sync::Arc;

use assessly_core::clock::Clock;
use assessly_core::idempotency::{deliver_once, DeliveryOutcome, IdempotencyStore};
use assessly_core::notify::{NotificationGateway, TemplateKind};
use assessly_core::reminders::ReminderWindow;
use assessly_db::models::interview_request::InterviewContext;
use assessly_db::repositories::InterviewRequestRepo;
use assessly_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::enrichment::template_data;
use crate::settings::ReminderSettings;

/// Counts for one poll across all windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Interviews found inside a window range.
    pub due: usize,
    pub sent: usize,
    /// Skipped because the claim was already taken.
    pub already_claimed: usize,
    /// Send or claim failures; these are retried next poll.
    pub failed: usize,
}

impl std::ops::AddAssign for PollReport {
    fn add_assign(&mut self, other: Self) {
        self.due += other.due;
        self.sent += other.sent;
        self.already_claimed += other.already_claimed;
        self.failed += other.failed;
    }
}

pub struct ReminderScheduler {
    pool: DbPool,
    store: Arc<dyn IdempotencyStore>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
}

impl ReminderScheduler {
    pub fn new(
        pool: DbPool,
        store: Arc<dyn IdempotencyStore>,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            pool,
            store,
            notifier,
            clock,
            settings,
        }
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// The first poll happens immediately. Poll errors are logged and the
    /// loop keeps going.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            poll_secs = self.settings.poll_interval.as_secs(),
            windows = self.settings.windows.len(),
            "Reminder scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(report) if report.due > 0 => {
                            tracing::info!(
                                due = report.due,
                                sent = report.sent,
                                already_claimed = report.already_claimed,
                                failed = report.failed,
                                "Reminder poll finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Reminder poll failed"),
                    }
                }
            }
        }
    }

    /// Run a single poll over every configured window at the clock's now.
    pub async fn poll_once(&self) -> Result<PollReport, sqlx::Error> {
        let now = self.clock.now();
        let span = self.settings.poll_span();
        let lookback = self.settings.retry_span();
        let mut report = PollReport::default();

        for window in &self.settings.windows {
            let (from, to) = window.range(now, span, lookback);
            let due = InterviewRequestRepo::list_due_for_reminder(&self.pool, from, to).await?;
            for ctx in &due {
                report += self.remind(window, ctx).await;
            }
        }

        Ok(report)
    }

    async fn remind(&self, window: &ReminderWindow, ctx: &InterviewContext) -> PollReport {
        let mut report = PollReport {
            due: 1,
            ..PollReport::default()
        };

        let recipient = ctx.candidate();
        if recipient.email.trim().is_empty() {
            tracing::warn!(
                interview_request_id = ctx.interview_request_id,
                window = %window.name,
                "Candidate has no email, reminder skipped"
            );
            report.failed = 1;
            return report;
        }

        let key = window.dedupe_key(ctx.spot_id);
        let data = template_data(ctx, None, Some(&window.name));
        let notifier = self.notifier.as_ref();
        let outcome = deliver_once(self.store.as_ref(), &key, self.settings.claim_ttl, || {
            notifier.send(&recipient, TemplateKind::SlotReminder, &data)
        })
        .await;

        match outcome {
            Ok(DeliveryOutcome::Sent) => {
                tracing::debug!(key = %key, "Reminder sent");
                report.sent = 1;
            }
            Ok(DeliveryOutcome::AlreadyClaimed) => report.already_claimed = 1,
            Ok(DeliveryOutcome::Failed { reason, released }) => {
                tracing::warn!(
                    key = %key,
                    error = %reason,
                    released,
                    "Reminder delivery failed"
                );
                report.failed = 1;
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Could not claim reminder");
                report.failed = 1;
            }
        }
        report
    }
}
