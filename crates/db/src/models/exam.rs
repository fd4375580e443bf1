use assessly_core::calendar::Participant;
use assessly_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `exams` table (scheduling-relevant columns only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exam {
    pub id: DbId,
    pub candidate_user_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub interview_scheduled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Exam {
    pub fn candidate(&self) -> Participant {
        Participant {
            name: self.candidate_name.clone(),
            email: self.candidate_email.clone(),
        }
    }
}

/// DTO for creating an exam row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExam {
    pub candidate_user_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
}
