use axum::routing::post;
use axum::Router;

use crate::handlers::exams;
use crate::state::AppState;

/// Routes mounted at `/exams`.
///
/// ```text
/// POST   /{exam_id}/interview-request   -> create_interview_request
/// POST   /{exam_id}/interview/book      -> book_interview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{exam_id}/interview-request",
            post(exams::create_interview_request),
        )
        .route("/{exam_id}/interview/book", post(exams::book_interview))
}
