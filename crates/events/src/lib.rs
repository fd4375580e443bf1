//! Outbound adapters for the scheduling core.
//!
//! Implements the calendar and notification capabilities declared in
//! `assessly_core` against real transports (an HTTP calendar service and
//! SMTP), plus the fallbacks used when those are not configured.

use std::sync::Arc;

use assessly_core::calendar::CalendarGateway;
use assessly_core::notify::NotificationGateway;

pub mod delivery;

pub use delivery::calendar::{CalendarConfig, DisabledCalendar, HttpCalendarGateway};
pub use delivery::email::{EmailConfig, LogOnlyNotifier, SmtpNotifier};

/// Build the calendar gateway from the environment.
///
/// Falls back to [`DisabledCalendar`] when `CALENDAR_API_URL` is unset or
/// the HTTP client cannot be built.
pub fn calendar_from_env() -> Arc<dyn CalendarGateway> {
    match CalendarConfig::from_env() {
        Some(config) => match HttpCalendarGateway::new(config) {
            Ok(gateway) => {
                tracing::info!(base_url = %gateway.base_url(), "Calendar integration enabled");
                Arc::new(gateway)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build calendar client, calendar disabled");
                Arc::new(DisabledCalendar)
            }
        },
        None => {
            tracing::info!("CALENDAR_API_URL not set, calendar integration disabled");
            Arc::new(DisabledCalendar)
        }
    }
}

/// Build the notification gateway from the environment.
///
/// Falls back to [`LogOnlyNotifier`] when `SMTP_HOST` is unset or the SMTP
/// transport cannot be built.
pub fn notifier_from_env() -> Arc<dyn NotificationGateway> {
    match EmailConfig::from_env() {
        Some(config) => match SmtpNotifier::new(config) {
            Ok(notifier) => {
                tracing::info!("SMTP notifications enabled");
                Arc::new(notifier)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build SMTP transport, notifications are log-only");
                Arc::new(LogOnlyNotifier)
            }
        },
        None => {
            tracing::info!("SMTP_HOST not set, notifications are log-only");
            Arc::new(LogOnlyNotifier)
        }
    }
}
