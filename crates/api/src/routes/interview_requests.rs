use axum::routing::{get, post};
use axum::Router;

use crate::handlers::interview_requests;
use crate::state::AppState;

/// Routes mounted at `/interview-requests`.
///
/// ```text
/// GET    /                          -> list
/// POST   /assign                    -> assign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(interview_requests::list))
        .route("/assign", post(interview_requests::assign))
}
