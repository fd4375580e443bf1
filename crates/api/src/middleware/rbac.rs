//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does
//! not meet the requirement.

use assessly_core::error::CoreError;
use assessly_core::roles::{ROLE_ADMIN, ROLE_CANDIDATE, ROLE_MENTOR};
use assessly_db::models::exam::Exam;
use assessly_db::models::mentor::Mentor;
use assessly_db::repositories::MentorRepo;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `mentor` or `admin` role and a mentor profile linked to the
/// caller's user id. Handlers under `/mentors/me` act on that profile.
///
/// ```ignore
/// async fn my_calendar(RequireMentor { mentor, .. }: RequireMentor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireMentor {
    pub user: AuthUser,
    pub mentor: Mentor,
}

impl FromRequestParts<AppState> for RequireMentor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_MENTOR {
            return Err(AppError::Core(CoreError::Forbidden(
                "Mentor or Admin role required".into(),
            )));
        }

        let mentor = MentorRepo::find_by_user_id(&state.pool, user.user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Forbidden(
                    "No mentor profile is linked to this user".into(),
                ))
            })?;

        Ok(RequireMentor { user, mentor })
    }
}

/// Whether `user` may act on `exam`: admins on any exam, candidates on
/// their own.
pub fn can_access_exam(user: &AuthUser, exam: &Exam) -> bool {
    user.role == ROLE_ADMIN
        || (user.role == ROLE_CANDIDATE && exam.candidate_user_id == Some(user.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exam(owner: i64) -> Exam {
        Exam {
            id: 1,
            candidate_user_id: Some(owner),
            candidate_name: "Ada".into(),
            candidate_email: "ada@example.com".into(),
            interview_scheduled: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(user_id: i64, role: &str) -> AuthUser {
        AuthUser {
            user_id,
            role: role.into(),
        }
    }

    #[test]
    fn candidates_access_only_their_own_exams() {
        assert!(can_access_exam(&user(7, ROLE_CANDIDATE), &exam(7)));
        assert!(!can_access_exam(&user(8, ROLE_CANDIDATE), &exam(7)));
    }

    #[test]
    fn admins_access_any_exam_and_mentors_none() {
        assert!(can_access_exam(&user(1, ROLE_ADMIN), &exam(7)));
        assert!(!can_access_exam(&user(7, ROLE_MENTOR), &exam(7)));
    }
}
