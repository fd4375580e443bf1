//! Reminder windows and dedupe keys.
//!
//! A reminder window is a named offset before a slot's start. Each poll
//! covers `[now + offset - retry_lookback, now + offset + poll_interval)`,
//! clamped so it never reaches behind `now`. Consecutive polls overlap by the
//! lookback: a start whose delivery failed is seen again on later polls, and
//! starts already reminded are absorbed by their dedupe claim.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Windows used when configuration does not override them.
pub const DEFAULT_WINDOWS: &str = "day_before=1440,soon=15";

/// A named offset before a slot's start at which one reminder is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderWindow {
    pub name: String,
    pub offset: Duration,
}

impl ReminderWindow {
    pub fn new(name: impl Into<String>, offset: Duration) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }

    /// The half-open range of slot start times this window covers for a poll
    /// at `now`.
    pub fn range(
        &self,
        now: Timestamp,
        poll_interval: Duration,
        retry_lookback: Duration,
    ) -> (Timestamp, Timestamp) {
        let edge = now + self.offset;
        let from = (edge - retry_lookback).max(now);
        (from, edge + poll_interval)
    }

    /// Key under which the reminder for `spot_id` in this window is claimed.
    pub fn dedupe_key(&self, spot_id: DbId) -> String {
        format!("reminder:{}:{spot_id}", self.name)
    }
}

/// Parse `name=minutes` pairs separated by commas, e.g. `day_before=1440,soon=15`.
pub fn parse_windows(spec: &str) -> Result<Vec<ReminderWindow>, CoreError> {
    let mut windows = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, minutes) = part.split_once('=').ok_or_else(|| {
            CoreError::Validation(format!("Invalid reminder window '{part}', expected name=minutes"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation(format!(
                "Reminder window '{part}' has an empty name"
            )));
        }
        let minutes: i64 = minutes.trim().parse().map_err(|_| {
            CoreError::Validation(format!("Invalid minutes in reminder window '{part}'"))
        })?;
        if minutes <= 0 {
            return Err(CoreError::Validation(format!(
                "Reminder window '{part}' must be a positive number of minutes"
            )));
        }
        if windows.iter().any(|w: &ReminderWindow| w.name == name) {
            return Err(CoreError::Validation(format!(
                "Duplicate reminder window '{name}'"
            )));
        }
        windows.push(ReminderWindow::new(name, Duration::minutes(minutes)));
    }
    Ok(windows)
}
