use assessly_core::status::{MentorBookingStatus, StatusId};
use assessly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `mentor_bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MentorBooking {
    pub id: DbId,
    pub mentor_id: DbId,
    pub interview_request_id: DbId,
    pub status_id: StatusId,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MentorBooking {
    pub fn status(&self) -> Option<MentorBookingStatus> {
        MentorBookingStatus::from_id(self.status_id)
    }
}
