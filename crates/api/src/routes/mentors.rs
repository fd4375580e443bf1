//! Route definitions for the calling mentor's resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::mentor_slots;
use crate::state::AppState;

/// Routes mounted at `/mentors/me`.
///
/// ```text
/// POST   /slots/bulk                -> bulk_slots
/// GET    /calendar                  -> calendar
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots/bulk", post(mentor_slots::bulk_slots))
        .route("/calendar", get(mentor_slots::calendar))
}
