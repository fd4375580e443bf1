//! Service settings loaded from the environment.

use std::time::Duration;

use assessly_core::error::CoreError;
use assessly_core::reminders::{parse_windows, ReminderWindow, DEFAULT_WINDOWS};
use assessly_core::slots::{parse_timezone, DEFAULT_TIMEZONE};

/// Join link stored on a slot when no calendar event could be created.
pub const DEFAULT_FALLBACK_MEET_URL: &str = "https://meet.google.com/";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// How far behind the window edge each poll looks for failed deliveries.
const DEFAULT_RETRY_LOOKBACK_SECS: u64 = 1800;

/// Two days: long enough to outlive the widest default window.
const DEFAULT_CLAIM_TTL_SECS: u64 = 172_800;

/// Settings shared by the reconciler and the booking orchestrator.
#[derive(Debug, Clone)]
pub struct SchedulingSettings {
    /// Timezone for availability that names none and whose mentor has none.
    pub default_timezone: String,
    pub fallback_meet_url: String,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            fallback_meet_url: DEFAULT_FALLBACK_MEET_URL.to_string(),
        }
    }
}

impl SchedulingSettings {
    /// | Variable                     | Default                    |
    /// |------------------------------|----------------------------|
    /// | `DEFAULT_TIMEZONE`           | `UTC`                      |
    /// | `CALENDAR_FALLBACK_MEET_URL` | `https://meet.google.com/` |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();
        let default_timezone = env_or("DEFAULT_TIMEZONE", defaults.default_timezone);
        parse_timezone(&default_timezone)?;
        Ok(Self {
            default_timezone,
            fallback_meet_url: env_or("CALENDAR_FALLBACK_MEET_URL", defaults.fallback_meet_url),
        })
    }
}

/// Settings for the reminder scheduler.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub poll_interval: Duration,
    pub windows: Vec<ReminderWindow>,
    /// Starts this far behind a window edge are polled again, so a released
    /// claim is retried on later polls.
    pub retry_lookback: Duration,
    /// Lifetime of a delivery claim in the idempotency store. Must outlive
    /// `retry_lookback + poll_interval` or a sent reminder is repeated.
    pub claim_ttl: Duration,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            windows: parse_windows(DEFAULT_WINDOWS).unwrap_or_default(),
            retry_lookback: Duration::from_secs(DEFAULT_RETRY_LOOKBACK_SECS),
            claim_ttl: Duration::from_secs(DEFAULT_CLAIM_TTL_SECS),
        }
    }
}

impl ReminderSettings {
    /// | Variable                       | Default                   |
    /// |--------------------------------|---------------------------|
    /// | `REMINDER_POLL_INTERVAL_SECS`  | `300`                     |
    /// | `REMINDER_WINDOWS`             | `day_before=1440,soon=15` |
    /// | `REMINDER_RETRY_LOOKBACK_SECS` | `1800`                    |
    /// | `REMINDER_CLAIM_TTL_SECS`      | `172800`                  |
    pub fn from_env() -> Result<Self, CoreError> {
        let poll_secs = secs_var("REMINDER_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let lookback_secs = secs_var("REMINDER_RETRY_LOOKBACK_SECS", DEFAULT_RETRY_LOOKBACK_SECS)?;
        let ttl_secs = secs_var("REMINDER_CLAIM_TTL_SECS", DEFAULT_CLAIM_TTL_SECS)?;
        let windows = parse_windows(&env_or("REMINDER_WINDOWS", DEFAULT_WINDOWS.to_string()))?;
        let settings = Self {
            poll_interval: Duration::from_secs(poll_secs),
            windows,
            retry_lookback: Duration::from_secs(lookback_secs),
            claim_ttl: Duration::from_secs(ttl_secs),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject a claim lifetime that expires while its start is still polled.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.claim_ttl <= self.retry_lookback + self.poll_interval {
            return Err(CoreError::Validation(format!(
                "REMINDER_CLAIM_TTL_SECS ({}) must exceed the retry lookback plus the poll interval ({})",
                self.claim_ttl.as_secs(),
                (self.retry_lookback + self.poll_interval).as_secs()
            )));
        }
        Ok(())
    }

    /// The poll interval as a calendar duration for window arithmetic.
    pub fn poll_span(&self) -> chrono::Duration {
        to_span(self.poll_interval)
    }

    pub fn retry_span(&self) -> chrono::Duration {
        to_span(self.retry_lookback)
    }
}

fn to_span(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn secs_var(name: &str, default: u64) -> Result<u64, CoreError> {
    parse_secs(name, std::env::var(name).ok().as_deref(), default)
}

fn parse_secs(name: &str, raw: Option<&str>, default: u64) -> Result<u64, CoreError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(CoreError::Validation(format!(
                "{name} must be a positive number of seconds, got '{value}'"
            ))),
        },
        None => Ok(default),
    }
}
