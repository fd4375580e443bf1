pub mod exams;
pub mod health;
pub mod interview_requests;
pub mod mentors;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /mentors/me/slots/bulk                  bulk create/delete slots (mentor)
/// /mentors/me/calendar                    slots with bound interviews (mentor)
///
/// /interview-requests                     list pending (mentor)
/// /interview-requests/assign              assign calling mentor (mentor)
///
/// /exams/{exam_id}/interview-request      upsert pending request (owner, admin)
/// /exams/{exam_id}/interview/book         self-service booking (owner, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/mentors/me", mentors::router())
        .nest("/interview-requests", interview_requests::router())
        .nest("/exams", exams::router())
}
