//! Repository for the `mentor_bookings` table.

use assessly_core::status::MentorBookingStatus;
use assessly_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::booking::MentorBooking;

const COLUMNS: &str =
    "id, mentor_id, interview_request_id, status_id, notes, created_at, updated_at";

pub struct MentorBookingRepo;

impl MentorBookingRepo {
    /// Insert an `Upcoming` booking. Fails with a unique violation on
    /// `uq_mentor_bookings_active_request` if the request already has one.
    pub async fn create(
        conn: &mut PgConnection,
        mentor_id: DbId,
        interview_request_id: DbId,
    ) -> Result<MentorBooking, sqlx::Error> {
        let query = format!(
            "INSERT INTO mentor_bookings (mentor_id, interview_request_id, status_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MentorBooking>(&query)
            .bind(mentor_id)
            .bind(interview_request_id)
            .bind(MentorBookingStatus::Upcoming.id())
            .fetch_one(conn)
            .await
    }

    /// Non-terminal bookings for any of the given requests.
    pub async fn find_active_by_requests(
        conn: &mut PgConnection,
        interview_request_ids: &[DbId],
    ) -> Result<Vec<MentorBooking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mentor_bookings
             WHERE interview_request_id = ANY($1) AND status_id = $2
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, MentorBooking>(&query)
            .bind(interview_request_ids)
            .bind(MentorBookingStatus::Upcoming.id())
            .fetch_all(conn)
            .await
    }

    /// Every booking ever made for a request, oldest first.
    pub async fn list_by_request(
        pool: &PgPool,
        interview_request_id: DbId,
    ) -> Result<Vec<MentorBooking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mentor_bookings
             WHERE interview_request_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, MentorBooking>(&query)
            .bind(interview_request_id)
            .fetch_all(pool)
            .await
    }
}
