//! Handlers for the `/interview-requests` resource.
//!
//! Mentors list pending requests and assign themselves to them.

use assessly_core::interview::AssignMentorRequest;
use assessly_core::status::MentorBookingStatus;
use assessly_core::types::{DbId, Timestamp};
use assessly_db::models::booking::MentorBooking;
use assessly_db::models::interview_request::InterviewRequest;
use assessly_db::repositories::InterviewRequestRepo;
use assessly_scheduling::AssignmentOutcome;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireMentor;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// `?status=` filter for `GET /interview-requests`. Only `pending` is served.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// One booking in the assignment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: DbId,
    pub interview_request_id: DbId,
    pub mentor_id: DbId,
    pub status: Option<MentorBookingStatus>,
    pub created_at: Timestamp,
}

impl From<&MentorBooking> for BookingResponse {
    fn from(booking: &MentorBooking) -> Self {
        Self {
            id: booking.id,
            interview_request_id: booking.interview_request_id,
            mentor_id: booking.mentor_id,
            status: booking.status(),
            created_at: booking.created_at,
        }
    }
}

/// Body of a successful assignment. Empty when there was nothing to do.
#[derive(Debug, Serialize)]
pub struct AssignResponse {
    pub bookings: Vec<BookingResponse>,
}

impl From<&AssignmentOutcome> for AssignResponse {
    fn from(outcome: &AssignmentOutcome) -> Self {
        Self {
            bookings: outcome.bookings().iter().map(BookingResponse::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/interview-requests?status=pending
///
/// Pending requests, oldest first.
pub async fn list(
    _mentor: RequireMentor,
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<InterviewRequest>>>> {
    match filter.status.as_deref().map(str::trim) {
        None | Some("") => {}
        Some(s) if s.eq_ignore_ascii_case("pending") => {}
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unsupported status filter '{other}', expected 'pending'"
            )));
        }
    }

    let requests =
        InterviewRequestRepo::list_pending(&state.pool, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/interview-requests/assign
///
/// Assign the calling mentor to the given requests. Requests that are
/// already booked are skipped; if all are, the response lists no bookings.
pub async fn assign(
    RequireMentor { mentor, .. }: RequireMentor,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<AssignMentorRequest>,
) -> AppResult<Json<AssignResponse>> {
    let outcome = state
        .orchestrator
        .assign_mentor(mentor.id, &input.interview_request_ids)
        .await?;
    Ok(Json(AssignResponse::from(&outcome)))
}
