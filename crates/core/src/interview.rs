//! Interview request state machine and booking input validation.

use serde::Deserialize;

use crate::error::CoreError;
use crate::status::InterviewRequestStatus;
use crate::types::{DbId, Timestamp};

/// Upper bound on ids accepted by one assignment call.
pub const MAX_ASSIGN_BATCH: usize = 100;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns the statuses reachable from `from`.
///
/// `Assigned` is terminal: cancellation and re-assignment are handled
/// outside the scheduling core.
pub fn valid_transitions(from: InterviewRequestStatus) -> &'static [InterviewRequestStatus] {
    match from {
        InterviewRequestStatus::Pending => &[InterviewRequestStatus::Assigned],
        InterviewRequestStatus::Assigned => &[],
    }
}

pub fn can_transition(from: InterviewRequestStatus, to: InterviewRequestStatus) -> bool {
    valid_transitions(from).contains(&to)
}

pub fn validate_transition(
    from: InterviewRequestStatus,
    to: InterviewRequestStatus,
) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid interview request transition: {from:?} -> {to:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /interview-requests/assign`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMentorRequest {
    pub interview_request_ids: Vec<DbId>,
}

/// Body of `POST /exams/{exam_id}/interview/book`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfServiceBookingRequest {
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub timezone: Option<String>,
}

/// Deduplicate ids preserving first-seen order and enforce batch limits.
pub fn normalize_request_ids(ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "interviewRequestIds: must not be empty".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    let unique: Vec<DbId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.len() > MAX_ASSIGN_BATCH {
        return Err(CoreError::Validation(format!(
            "interviewRequestIds: at most {MAX_ASSIGN_BATCH} ids per call"
        )));
    }
    Ok(unique)
}

/// Validate a self-service interval and return its length in minutes.
pub fn validate_interval(start_at: Timestamp, end_at: Timestamp) -> Result<i32, CoreError> {
    if end_at <= start_at {
        return Err(CoreError::Validation(
            "endAt: must be after startAt".into(),
        ));
    }
    i32::try_from((end_at - start_at).num_minutes())
        .map_err(|_| CoreError::Validation("endAt: interval is too long".into()))
}
