//! Repository for the `mentor_time_spots` table.

use assessly_core::status::TimeSpotStatus;
use assessly_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::time_spot::{CalendarEntry, DeletedSpot, MentorTimeSpot, NewTimeSpot};

const COLUMNS: &str = "id, mentor_id, start_at, end_at, duration_minutes, timezone, status_id, \
    meet_url, calendar_event_id, created_at, updated_at";

/// Bind parameters per row in the multi-row insert.
const PARAMS_PER_ROW: usize = 8;

/// Rows per insert statement, keeping bind parameters well under the
/// PostgreSQL limit of 65535.
const INSERT_CHUNK: usize = 1000;

pub struct TimeSpotRepo;

impl TimeSpotRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MentorTimeSpot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mentor_time_spots WHERE id = $1");
        sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Spots owned by `mentor_id` among `ids`. Ids of other mentors' spots
    /// are silently excluded.
    pub async fn find_for_mentor_by_ids(
        pool: &PgPool,
        mentor_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<MentorTimeSpot>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM mentor_time_spots
             WHERE mentor_id = $1 AND id = ANY($2)
             ORDER BY start_at ASC"
        );
        sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(mentor_id)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lock the spots owned by `mentor_id` among `ids` for the rest of the
    /// transaction.
    pub async fn lock_for_mentor_by_ids(
        conn: &mut PgConnection,
        mentor_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<MentorTimeSpot>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM mentor_time_spots
             WHERE mentor_id = $1 AND id = ANY($2)
             ORDER BY id ASC
             FOR UPDATE"
        );
        sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(mentor_id)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Spots owned by `mentor_id` starting at any of `starts`.
    pub async fn find_for_mentor_by_starts(
        pool: &PgPool,
        mentor_id: DbId,
        starts: &[Timestamp],
    ) -> Result<Vec<MentorTimeSpot>, sqlx::Error> {
        if starts.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM mentor_time_spots
             WHERE mentor_id = $1 AND start_at = ANY($2)
             ORDER BY start_at ASC"
        );
        sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(mentor_id)
            .bind(starts)
            .fetch_all(pool)
            .await
    }

    /// Insert spots, silently skipping any whose `(mentor_id, start_at)` is
    /// already taken. Returns only the rows actually inserted.
    pub async fn insert_skip_duplicates(
        conn: &mut PgConnection,
        spots: &[NewTimeSpot],
    ) -> Result<Vec<MentorTimeSpot>, sqlx::Error> {
        let mut inserted = Vec::with_capacity(spots.len());

        for chunk in spots.chunks(INSERT_CHUNK) {
            let mut query = String::from(
                "INSERT INTO mentor_time_spots \
                 (mentor_id, start_at, end_at, duration_minutes, timezone, status_id, meet_url, calendar_event_id) \
                 VALUES ",
            );
            for i in 0..chunk.len() {
                if i > 0 {
                    query.push_str(", ");
                }
                let base = i * PARAMS_PER_ROW;
                let placeholders: Vec<String> =
                    (1..=PARAMS_PER_ROW).map(|p| format!("${}", base + p)).collect();
                query.push('(');
                query.push_str(&placeholders.join(", "));
                query.push(')');
            }
            query.push_str(&format!(
                " ON CONFLICT ON CONSTRAINT uq_mentor_time_spots_mentor_start DO NOTHING \
                 RETURNING {COLUMNS}"
            ));

            let mut q = sqlx::query_as::<_, MentorTimeSpot>(&query);
            for s in chunk {
                q = q
                    .bind(s.mentor_id)
                    .bind(s.start_at)
                    .bind(s.end_at)
                    .bind(s.duration_minutes)
                    .bind(&s.timezone)
                    .bind(s.status_id)
                    .bind(&s.meet_url)
                    .bind(&s.calendar_event_id);
            }
            inserted.extend(q.fetch_all(&mut *conn).await?);
        }

        inserted.sort_by_key(|s| s.start_at);
        Ok(inserted)
    }

    /// Delete the mentor's unbooked spots among `ids`. Booked spots are left
    /// untouched even if listed.
    pub async fn delete_unbooked(
        conn: &mut PgConnection,
        mentor_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<DeletedSpot>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, DeletedSpot>(
            "DELETE FROM mentor_time_spots
             WHERE mentor_id = $1 AND id = ANY($2) AND status_id <> $3
             RETURNING id, calendar_event_id",
        )
        .bind(mentor_id)
        .bind(ids)
        .bind(TimeSpotStatus::Booked.id())
        .fetch_all(conn)
        .await
    }

    /// Atomically take up to `limit` of the mentor's free spots starting
    /// after `after`, earliest first, and mark them booked.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent assignments never claim
    /// the same spot.
    pub async fn claim_free_for_mentor(
        conn: &mut PgConnection,
        mentor_id: DbId,
        after: Timestamp,
        limit: i64,
    ) -> Result<Vec<MentorTimeSpot>, sqlx::Error> {
        let query = format!(
            "UPDATE mentor_time_spots
             SET status_id = $1
             WHERE id IN (
                 SELECT id FROM mentor_time_spots
                 WHERE mentor_id = $2 AND status_id = ANY($3) AND start_at > $4
                 ORDER BY start_at ASC
                 LIMIT $5
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        let free = [TimeSpotStatus::Available.id(), TimeSpotStatus::Held.id()];
        let mut claimed = sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(TimeSpotStatus::Booked.id())
            .bind(mentor_id)
            .bind(&free[..])
            .bind(after)
            .bind(limit)
            .fetch_all(conn)
            .await?;
        claimed.sort_by_key(|s| s.start_at);
        Ok(claimed)
    }

    /// Insert a booked spot, or book the mentor's existing unbooked spot at
    /// the same start instant. Returns `None` if that spot is already booked.
    pub async fn upsert_booked(
        conn: &mut PgConnection,
        spot: &NewTimeSpot,
    ) -> Result<Option<MentorTimeSpot>, sqlx::Error> {
        let query = format!(
            "INSERT INTO mentor_time_spots
                 (mentor_id, start_at, end_at, duration_minutes, timezone, status_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_mentor_time_spots_mentor_start DO UPDATE
             SET end_at = EXCLUDED.end_at,
                 duration_minutes = EXCLUDED.duration_minutes,
                 timezone = EXCLUDED.timezone,
                 status_id = EXCLUDED.status_id
             WHERE mentor_time_spots.status_id <> EXCLUDED.status_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MentorTimeSpot>(&query)
            .bind(spot.mentor_id)
            .bind(spot.start_at)
            .bind(spot.end_at)
            .bind(spot.duration_minutes)
            .bind(&spot.timezone)
            .bind(TimeSpotStatus::Booked.id())
            .fetch_optional(conn)
            .await
    }

    /// Whether the mentor has a booked spot overlapping `[start_at, end_at)`.
    pub async fn has_booked_overlap(
        conn: &mut PgConnection,
        mentor_id: DbId,
        start_at: Timestamp,
        end_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM mentor_time_spots
                 WHERE mentor_id = $1 AND status_id = $2
                   AND start_at < $4 AND end_at > $3
             )",
        )
        .bind(mentor_id)
        .bind(TimeSpotStatus::Booked.id())
        .bind(start_at)
        .bind(end_at)
        .fetch_one(conn)
        .await
    }

    /// Store the meeting link and external event reference for a spot.
    pub async fn set_meeting(
        pool: &PgPool,
        id: DbId,
        meet_url: &str,
        calendar_event_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE mentor_time_spots SET meet_url = $2, calendar_event_id = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(meet_url)
        .bind(calendar_event_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The mentor's spots starting in `[from, to)` with the interview bound
    /// to each, if any.
    pub async fn list_calendar(
        pool: &PgPool,
        mentor_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<CalendarEntry>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEntry>(
            "SELECT s.id, s.start_at, s.end_at, s.duration_minutes, s.timezone, s.status_id,
                    s.meet_url,
                    ir.id AS interview_request_id,
                    e.id AS exam_id,
                    e.candidate_name,
                    e.candidate_email
             FROM mentor_time_spots s
             LEFT JOIN interview_requests ir ON ir.current_spot_id = s.id
             LEFT JOIN exams e ON e.id = ir.exam_id
             WHERE s.mentor_id = $1 AND s.start_at >= $2 AND s.start_at < $3
             ORDER BY s.start_at ASC",
        )
        .bind(mentor_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
