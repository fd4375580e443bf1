//! Handlers for the authenticated mentor's own slots (`/mentors/me`).
//!
//! All endpoints require [`RequireMentor`].

use assessly_core::error::CoreError;
use assessly_core::slots::BulkSlotRequest;
use assessly_core::types::Timestamp;
use assessly_db::models::time_spot::CalendarEntry;
use assessly_db::repositories::TimeSpotRepo;
use assessly_scheduling::ReconcileOutcome;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireMentor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Calendar range used when `to` is omitted.
const DEFAULT_CALENDAR_DAYS: i64 = 30;

/// Longest calendar range a single request may cover.
const MAX_CALENDAR_DAYS: i64 = 92;

/// Query parameters for `GET /mentors/me/calendar`.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// Inclusive lower bound on slot start. Defaults to now.
    pub from: Option<Timestamp>,
    /// Exclusive upper bound on slot start. Defaults to `from` + 30 days.
    pub to: Option<Timestamp>,
}

impl CalendarQuery {
    fn resolve(&self, now: Timestamp) -> Result<(Timestamp, Timestamp), CoreError> {
        let from = self.from.unwrap_or(now);
        let to = self
            .to
            .unwrap_or(from + Duration::days(DEFAULT_CALENDAR_DAYS));
        if to <= from {
            return Err(CoreError::Validation("to: must be after from".into()));
        }
        if to - from > Duration::days(MAX_CALENDAR_DAYS) {
            return Err(CoreError::Validation(format!(
                "to: range must not exceed {MAX_CALENDAR_DAYS} days"
            )));
        }
        Ok((from, to))
    }
}

/// POST /api/v1/mentors/me/slots/bulk
///
/// Generate slots from the availability template, apply the deletion list
/// and report `{ created, deleted }`.
pub async fn bulk_slots(
    RequireMentor { mentor, .. }: RequireMentor,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<BulkSlotRequest>,
) -> AppResult<Json<ReconcileOutcome>> {
    let outcome = state.reconciler.reconcile(mentor.id, &input).await?;
    Ok(Json(outcome))
}

/// GET /api/v1/mentors/me/calendar?from=&to=
///
/// The mentor's spots in the range, each with the interview bound to it.
pub async fn calendar(
    RequireMentor { mentor, .. }: RequireMentor,
    State(state): State<AppState>,
    Query(params): Query<CalendarQuery>,
) -> AppResult<Json<DataResponse<Vec<CalendarEntry>>>> {
    let (from, to) = params.resolve(Utc::now())?;
    let entries = TimeSpotRepo::list_calendar(&state.pool, mentor.id, from, to).await?;
    Ok(Json(DataResponse { data: entries }))
}
