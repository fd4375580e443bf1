//! Mentor selection for self-service bookings.

use assessly_core::types::Timestamp;
use assessly_db::models::mentor::Mentor;
use assessly_db::repositories::MentorRepo;
use assessly_db::DbPool;
use async_trait::async_trait;

/// Chooses the mentor who will take a self-service booking for
/// `[start_at, end_at)`. Returns `None` when nobody can.
#[async_trait]
pub trait MentorSelectionPolicy: Send + Sync {
    async fn select(
        &self,
        pool: &DbPool,
        start_at: Timestamp,
        end_at: Timestamp,
    ) -> Result<Option<Mentor>, sqlx::Error>;
}

/// Always picks the longest-registered active mentor, ignoring the
/// requested interval. Overlaps are rejected later by the booking itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct OldestActiveMentor;

#[async_trait]
impl MentorSelectionPolicy for OldestActiveMentor {
    async fn select(
        &self,
        pool: &DbPool,
        _start_at: Timestamp,
        _end_at: Timestamp,
    ) -> Result<Option<Mentor>, sqlx::Error> {
        MentorRepo::find_oldest_active(pool).await
    }
}
