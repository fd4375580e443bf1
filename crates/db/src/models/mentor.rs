use assessly_core::calendar::Participant;
use assessly_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `mentors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mentor {
    pub id: DbId,
    /// Identity of the mentor's user account (JWT `sub`).
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Mentor {
    pub fn participant(&self) -> Participant {
        Participant {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// DTO for registering a mentor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMentor {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub timezone: Option<String>,
}
