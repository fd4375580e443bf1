//! Repository for the `interview_requests` table.

use assessly_core::status::InterviewRequestStatus;
use assessly_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::interview_request::{InterviewContext, InterviewRequest};

const COLUMNS: &str = "id, exam_id, status_id, current_spot_id, created_at, updated_at";

/// Select list and joins shared by the [`InterviewContext`] queries.
const CONTEXT_SELECT: &str = "SELECT ir.id AS interview_request_id, ir.exam_id,
        s.id AS spot_id, s.start_at, s.end_at, s.timezone, s.meet_url, s.calendar_event_id,
        e.candidate_name, e.candidate_email,
        m.id AS mentor_id, m.name AS mentor_name, m.email AS mentor_email
     FROM interview_requests ir
     JOIN mentor_time_spots s ON s.id = ir.current_spot_id
     JOIN exams e ON e.id = ir.exam_id
     JOIN mentors m ON m.id = s.mentor_id";

pub struct InterviewRequestRepo;

impl InterviewRequestRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<InterviewRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM interview_requests WHERE id = $1");
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_exam(
        pool: &PgPool,
        exam_id: DbId,
    ) -> Result<Option<InterviewRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM interview_requests WHERE exam_id = $1");
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(exam_id)
            .fetch_optional(pool)
            .await
    }

    /// The subset of `ids` that exist.
    pub async fn find_existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM interview_requests WHERE id = ANY($1) ORDER BY id ASC",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Pending requests, oldest first.
    pub async fn list_pending(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InterviewRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM interview_requests
             WHERE status_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(InterviewRequestStatus::Pending.id())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Create the pending request for an exam, or return the existing one.
    ///
    /// Returns the row and whether it was created by this call.
    pub async fn upsert_pending(
        pool: &PgPool,
        exam_id: DbId,
    ) -> Result<(InterviewRequest, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO interview_requests (exam_id, status_id)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_interview_requests_exam_id DO NOTHING
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(exam_id)
            .bind(InterviewRequestStatus::Pending.id())
            .fetch_optional(pool)
            .await?;

        match created {
            Some(row) => Ok((row, true)),
            None => {
                let existing = Self::find_by_exam(pool, exam_id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
        }
    }

    /// Insert a pending request inside a transaction. Fails with a unique
    /// violation on `uq_interview_requests_exam_id` if the exam has one.
    pub async fn insert_pending(
        conn: &mut PgConnection,
        exam_id: DbId,
    ) -> Result<InterviewRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO interview_requests (exam_id, status_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(exam_id)
            .bind(InterviewRequestStatus::Pending.id())
            .fetch_one(conn)
            .await
    }

    /// Lock the requests among `ids`, in id order.
    ///
    /// Rows a concurrent transaction changed first are returned in their
    /// committed state once its lock is released.
    pub async fn lock_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<InterviewRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM interview_requests
             WHERE id = ANY($1)
             ORDER BY id ASC
             FOR UPDATE"
        );
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Move a pending request to assigned, binding `spot_id`. Status and
    /// spot are written by this single statement. Returns `None` if the
    /// request is not pending.
    pub async fn assign(
        conn: &mut PgConnection,
        id: DbId,
        spot_id: DbId,
    ) -> Result<Option<InterviewRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE interview_requests
             SET status_id = $3, current_spot_id = $2
             WHERE id = $1 AND status_id = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InterviewRequest>(&query)
            .bind(id)
            .bind(spot_id)
            .bind(InterviewRequestStatus::Assigned.id())
            .bind(InterviewRequestStatus::Pending.id())
            .fetch_optional(conn)
            .await
    }

    /// Assigned requests among `ids` joined with spot, candidate and mentor.
    pub async fn load_contexts(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<InterviewContext>, sqlx::Error> {
        let query = format!("{CONTEXT_SELECT} WHERE ir.id = ANY($1) ORDER BY s.start_at ASC");
        sqlx::query_as::<_, InterviewContext>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Assigned interviews whose spot starts in `[from, to)`.
    pub async fn list_due_for_reminder(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<InterviewContext>, sqlx::Error> {
        let query = format!(
            "{CONTEXT_SELECT}
             WHERE ir.status_id = $1 AND s.start_at >= $2 AND s.start_at < $3
             ORDER BY s.start_at ASC, ir.id ASC"
        );
        sqlx::query_as::<_, InterviewContext>(&query)
            .bind(InterviewRequestStatus::Assigned.id())
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}
