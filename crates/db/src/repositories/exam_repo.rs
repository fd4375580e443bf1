//! Repository for the `exams` table.

use assessly_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::exam::{CreateExam, Exam};

const COLUMNS: &str = "id, candidate_user_id, candidate_name, candidate_email, \
    interview_scheduled, created_at, updated_at";

pub struct ExamRepo;

impl ExamRepo {
    pub async fn create(pool: &PgPool, input: &CreateExam) -> Result<Exam, sqlx::Error> {
        let query = format!(
            "INSERT INTO exams (candidate_user_id, candidate_name, candidate_email)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Exam>(&query)
            .bind(input.candidate_user_id)
            .bind(&input.candidate_name)
            .bind(&input.candidate_email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Exam>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM exams WHERE id = $1");
        sqlx::query_as::<_, Exam>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Flag the exam as having its interview scheduled.
    pub async fn mark_interview_scheduled(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE exams SET interview_scheduled = true WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
