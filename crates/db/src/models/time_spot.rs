use assessly_core::reconcile::PersistedSpot;
use assessly_core::slots::SlotCandidate;
use assessly_core::status::{StatusId, TimeSpotStatus};
use assessly_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `mentor_time_spots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MentorTimeSpot {
    pub id: DbId,
    pub mentor_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub duration_minutes: i32,
    pub timezone: String,
    pub status_id: StatusId,
    pub meet_url: Option<String>,
    pub calendar_event_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MentorTimeSpot {
    pub fn status(&self) -> Option<TimeSpotStatus> {
        TimeSpotStatus::from_id(self.status_id)
    }

    pub fn is_booked(&self) -> bool {
        self.status_id == TimeSpotStatus::Booked.id()
    }

    /// The view of this spot the reconciliation planner works with.
    ///
    /// Unknown status ids are treated as booked so they are never deleted.
    pub fn as_persisted(&self) -> PersistedSpot {
        PersistedSpot {
            id: self.id,
            start_at: self.start_at,
            status: self.status().unwrap_or(TimeSpotStatus::Booked),
        }
    }
}

/// DTO for inserting a spot.
#[derive(Debug, Clone)]
pub struct NewTimeSpot {
    pub mentor_id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub duration_minutes: i32,
    pub timezone: String,
    pub status_id: StatusId,
    pub meet_url: Option<String>,
    pub calendar_event_id: Option<String>,
}

impl NewTimeSpot {
    /// Build an insert row from a generated candidate plus its meeting info.
    pub fn from_candidate(
        candidate: &SlotCandidate,
        meet_url: Option<String>,
        calendar_event_id: Option<String>,
    ) -> Self {
        Self {
            mentor_id: candidate.mentor_id,
            start_at: candidate.start_at,
            end_at: candidate.end_at,
            duration_minutes: candidate.duration_minutes,
            timezone: candidate.timezone.clone(),
            status_id: candidate.status.id(),
            meet_url,
            calendar_event_id,
        }
    }
}

/// Id and external event reference of a deleted spot.
#[derive(Debug, Clone, FromRow)]
pub struct DeletedSpot {
    pub id: DbId,
    pub calendar_event_id: Option<String>,
}

/// One entry of a mentor's calendar: a spot plus the interview bound to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CalendarEntry {
    pub id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub duration_minutes: i32,
    pub timezone: String,
    pub status_id: StatusId,
    pub meet_url: Option<String>,
    pub interview_request_id: Option<DbId>,
    pub exam_id: Option<DbId>,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
}
