use assessly_core::calendar::Participant;
use assessly_core::status::{InterviewRequestStatus, StatusId};
use assessly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `interview_requests` table.
///
/// `current_spot_id` is set in the same statement that moves the request to
/// `Assigned`; a CHECK constraint keeps the two in lockstep.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InterviewRequest {
    pub id: DbId,
    pub exam_id: DbId,
    pub status_id: StatusId,
    pub current_spot_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl InterviewRequest {
    pub fn status(&self) -> Option<InterviewRequestStatus> {
        InterviewRequestStatus::from_id(self.status_id)
    }
}

/// An assigned interview joined with its spot, candidate and mentor.
///
/// Used for post-assignment calendar/notification enrichment and by the
/// reminder scheduler.
#[derive(Debug, Clone, FromRow)]
pub struct InterviewContext {
    pub interview_request_id: DbId,
    pub exam_id: DbId,
    pub spot_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub timezone: String,
    pub meet_url: Option<String>,
    pub calendar_event_id: Option<String>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub mentor_id: DbId,
    pub mentor_name: String,
    pub mentor_email: String,
}

impl InterviewContext {
    pub fn candidate(&self) -> Participant {
        Participant {
            name: self.candidate_name.clone(),
            email: self.candidate_email.clone(),
        }
    }

    pub fn mentor(&self) -> Participant {
        Participant {
            name: self.mentor_name.clone(),
            email: self.mentor_email.clone(),
        }
    }

    /// Both participants have a usable email address.
    pub fn has_contacts(&self) -> bool {
        !self.candidate_email.trim().is_empty() && !self.mentor_email.trim().is_empty()
    }
}
