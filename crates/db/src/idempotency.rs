//! PostgreSQL-backed [`IdempotencyStore`].
//!
//! Claims live in `idempotency_keys`. An expired row is treated as absent:
//! `set_if_absent` overwrites it in the same statement that would otherwise
//! conflict, so the check and the claim are one atomic step.

use std::time::Duration;

use assessly_core::idempotency::{IdempotencyError, IdempotencyStore};
use async_trait::async_trait;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgIdempotencyStore {
    pool: PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired claims. Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn unavailable(err: sqlx::Error) -> IdempotencyError {
    IdempotencyError::Unavailable(err.to_string())
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, IdempotencyError> {
        let claimed = sqlx::query_scalar::<_, String>(
            "INSERT INTO idempotency_keys (key, value, expires_at)
             VALUES ($1, $2, NOW() + make_interval(secs => $3))
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value,
                 expires_at = EXCLUDED.expires_at,
                 created_at = NOW()
             WHERE idempotency_keys.expires_at <= NOW()
             RETURNING key",
        )
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(claimed.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, IdempotencyError> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM idempotency_keys WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), IdempotencyError> {
        sqlx::query("DELETE FROM idempotency_keys WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
