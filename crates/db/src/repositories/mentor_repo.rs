//! Repository for the `mentors` table.

use assessly_core::slots::DEFAULT_TIMEZONE;
use assessly_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::mentor::{CreateMentor, Mentor};

const COLUMNS: &str = "id, user_id, name, email, timezone, is_active, created_at, updated_at";

pub struct MentorRepo;

impl MentorRepo {
    pub async fn create(pool: &PgPool, input: &CreateMentor) -> Result<Mentor, sqlx::Error> {
        let query = format!(
            "INSERT INTO mentors (user_id, name, email, timezone)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mentor>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Mentor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mentors WHERE id = $1");
        sqlx::query_as::<_, Mentor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock the mentor row for the rest of the transaction. Serializes
    /// bookings that check the mentor's calendar before writing to it.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Mentor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mentors WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Mentor>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve the mentor profile belonging to an authenticated user.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Mentor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mentors WHERE user_id = $1");
        sqlx::query_as::<_, Mentor>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The active mentor registered first (ties broken by id).
    pub async fn find_oldest_active(pool: &PgPool) -> Result<Option<Mentor>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mentors
             WHERE is_active
             ORDER BY created_at ASC, id ASC
             LIMIT 1"
        );
        sqlx::query_as::<_, Mentor>(&query).fetch_optional(pool).await
    }

    pub async fn set_active(pool: &PgPool, id: DbId, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE mentors SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
