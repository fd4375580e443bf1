//! Handlers for interview scheduling under `/exams/{exam_id}`.
//!
//! Admins may act on any exam; candidates only on their own.

use assessly_core::error::CoreError;
use assessly_core::interview::SelfServiceBookingRequest;
use assessly_core::types::DbId;
use assessly_db::models::booking::MentorBooking;
use assessly_db::models::exam::Exam;
use assessly_db::models::interview_request::InterviewRequest;
use assessly_db::models::time_spot::MentorTimeSpot;
use assessly_db::repositories::{ExamRepo, TimeSpotRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::can_access_exam;
use crate::response::DataResponse;
use crate::state::AppState;

/// Rows created by a self-service booking.
#[derive(Debug, Serialize)]
pub struct BookedInterview {
    pub interview_request: InterviewRequest,
    pub spot: MentorTimeSpot,
    pub booking: MentorBooking,
}

async fn load_exam(state: &AppState, user: &AuthUser, exam_id: DbId) -> AppResult<Exam> {
    let exam = ExamRepo::find_by_id(&state.pool, exam_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Exam",
            id: exam_id,
        }))?;
    if !can_access_exam(user, &exam) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not allowed to schedule interviews for this exam".into(),
        )));
    }
    Ok(exam)
}

/// POST /api/v1/exams/{exam_id}/interview-request
///
/// Create the pending interview request for an exam (201), or return the
/// existing one (200).
pub async fn create_interview_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(exam_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<InterviewRequest>>)> {
    load_exam(&state, &auth, exam_id).await?;

    let (request, created) = state.orchestrator.create_interview_request(exam_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: request })))
}

/// POST /api/v1/exams/{exam_id}/interview/book
///
/// Book an interview at a candidate-chosen interval with the mentor picked
/// by the selection policy.
pub async fn book_interview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(exam_id): Path<DbId>,
    JsonBody(input): JsonBody<SelfServiceBookingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BookedInterview>>)> {
    load_exam(&state, &auth, exam_id).await?;

    let booked = state.orchestrator.book_self_service(exam_id, &input).await?;

    // The join link is stored after commit; return the spot as it is now.
    let spot = TimeSpotRepo::find_by_id(&state.pool, booked.spot.id)
        .await?
        .unwrap_or(booked.spot);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BookedInterview {
                interview_request: booked.interview_request,
                spot,
                booking: booked.booking,
            },
        }),
    ))
}
