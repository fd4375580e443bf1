//! Slot generation from recurring availability.
//!
//! [`generate_slots`] expands a mentor's declared availability (calendar
//! dates, each with one or more `HH:mm` ranges interpreted in the request's
//! timezone) into discrete, non-overlapping [`SlotCandidate`]s. It performs no
//! I/O: identical input always yields the identical ordered candidate list,
//! which the reconciler relies on because `start_at` is the identity key of a
//! persisted spot.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::reconcile::ConflictPolicy;
use crate::status::TimeSpotStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Slot lengths a mentor may publish, in minutes.
pub const ALLOWED_DURATIONS_MIN: &[i32] = &[15, 30, 45, 60];

/// Upper bound for the gap between consecutive slots.
pub const MAX_BUFFER_MINUTES: i32 = 60;

/// Buffer applied when the request omits `bufferMinutes`.
pub const DEFAULT_BUFFER_MINUTES: i32 = 0;

/// Timezone used when neither the request nor configuration provide one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Accepted as a range end meaning "midnight at the end of the day".
const END_OF_DAY: &str = "24:00";

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// One `HH:mm`-`HH:mm` range within an availability day.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TimeRangeInput {
    pub start: String,
    pub end: String,
}

/// A calendar date with the ranges the mentor is available on it.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AvailabilityDay {
    pub date: String,
    #[validate(length(min = 1, message = "at least one range is required"))]
    pub ranges: Vec<TimeRangeInput>,
}

/// Body of `POST /mentors/me/slots/bulk`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkSlotRequest {
    pub timezone: Option<String>,
    pub duration_min: Option<i32>,
    #[validate(range(min = 0, max = 60))]
    pub buffer_minutes: Option<i32>,
    pub default_status: Option<TimeSpotStatus>,
    #[serde(default)]
    #[validate(nested)]
    pub availabilities: Vec<AvailabilityDay>,
    #[serde(default)]
    pub deleted_slot_ids: Vec<DbId>,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A generated slot that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCandidate {
    pub mentor_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub duration_minutes: i32,
    pub timezone: String,
    pub status: TimeSpotStatus,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Expand `request` into ordered slot candidates owned by `mentor_id`.
///
/// `default_timezone` applies when the request carries no (or an empty)
/// timezone. Any malformed date, time, range, duration or timezone rejects
/// the whole request; nothing is generated partially. A request without
/// availabilities (deletions only) yields no candidates and needs no
/// duration.
pub fn generate_slots(
    mentor_id: DbId,
    request: &BulkSlotRequest,
    default_timezone: &str,
) -> Result<Vec<SlotCandidate>, CoreError> {
    request.validate()?;
    if request.availabilities.is_empty() {
        return Ok(Vec::new());
    }

    let tz_name = request
        .timezone
        .as_deref()
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(default_timezone);
    let tz = parse_timezone(tz_name)?;

    let duration = validate_duration(request.duration_min)?;
    let buffer = request.buffer_minutes.unwrap_or(DEFAULT_BUFFER_MINUTES);
    let status = validate_default_status(request.default_status)?;

    let mut candidates = Vec::new();

    for (day_idx, day) in request.availabilities.iter().enumerate() {
        let date = NaiveDate::parse_from_str(day.date.trim(), DATE_FORMAT).map_err(|_| {
            CoreError::Validation(format!(
                "availabilities[{day_idx}].date: invalid date '{}', expected YYYY-MM-DD",
                day.date
            ))
        })?;

        for (range_idx, range) in day.ranges.iter().enumerate() {
            let field = format!("availabilities[{day_idx}].ranges[{range_idx}]");
            let local_start = parse_local(date, &range.start, &field, "start")?;
            let local_end = parse_local(date, &range.end, &field, "end")?;

            if local_end <= local_start {
                return Err(CoreError::Validation(format!(
                    "{field}: end {} must be after start {}",
                    range.end, range.start
                )));
            }

            let start = resolve_local(&tz, local_start, &field)?;
            let end = resolve_local(&tz, local_end, &field)?;

            for (start_at, end_at) in expand_range(start, end, duration, buffer) {
                candidates.push(SlotCandidate {
                    mentor_id,
                    start_at,
                    end_at,
                    duration_minutes: duration,
                    timezone: tz_name.to_string(),
                    status,
                });
            }
        }
    }

    Ok(candidates)
}

/// Walk `[start, end)` in steps of `duration + buffer` minutes, emitting
/// `[t, t + duration)` while it fits inside the range.
pub fn expand_range(
    start: Timestamp,
    end: Timestamp,
    duration_minutes: i32,
    buffer_minutes: i32,
) -> Vec<(Timestamp, Timestamp)> {
    let mut slots = Vec::new();
    if duration_minutes <= 0 || buffer_minutes < 0 {
        return slots;
    }

    let length = Duration::minutes(i64::from(duration_minutes));
    let step = length + Duration::minutes(i64::from(buffer_minutes));

    let mut t = start;
    while t + length <= end {
        slots.push((t, t + length));
        t += step;
    }
    slots
}

/// Parse an IANA timezone name (e.g. `Europe/Berlin`).
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::Validation(format!("timezone: unknown timezone '{name}'")))
}

fn validate_duration(duration: Option<i32>) -> Result<i32, CoreError> {
    let duration =
        duration.ok_or_else(|| CoreError::Validation("durationMin: is required".into()))?;
    if !ALLOWED_DURATIONS_MIN.contains(&duration) {
        return Err(CoreError::Validation(format!(
            "durationMin: {duration} is not one of {ALLOWED_DURATIONS_MIN:?}"
        )));
    }
    Ok(duration)
}

fn validate_default_status(status: Option<TimeSpotStatus>) -> Result<TimeSpotStatus, CoreError> {
    match status.unwrap_or(TimeSpotStatus::Available) {
        TimeSpotStatus::Booked => Err(CoreError::Validation(
            "defaultStatus: must be AVAILABLE or HELD".into(),
        )),
        other => Ok(other),
    }
}

fn parse_local(
    date: NaiveDate,
    value: &str,
    field: &str,
    which: &str,
) -> Result<NaiveDateTime, CoreError> {
    let value = value.trim();
    if which == "end" && value == END_OF_DAY {
        if let Some(next) = date.succ_opt() {
            return Ok(next.and_time(NaiveTime::MIN));
        }
    }
    let time = NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| {
        CoreError::Validation(format!(
            "{field}.{which}: invalid time '{value}', expected HH:mm"
        ))
    })?;
    Ok(date.and_time(time))
}

/// Map a local wall-clock time to UTC. Ambiguous times (DST fall-back)
/// resolve to the earlier instant; times skipped by a DST jump are rejected.
fn resolve_local(tz: &Tz, local: NaiveDateTime, field: &str) -> Result<Timestamp, CoreError> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "{field}: local time {local} does not exist in timezone {}",
                tz.name()
            ))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
