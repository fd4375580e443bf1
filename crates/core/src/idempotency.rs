//! Idempotency store capability and the claim/release delivery helper.
//!
//! A side effect guarded by [`deliver_once`] is attempted at most once per key
//! while the claim stands. A failed attempt releases the claim so a later
//! call (the next scheduler poll) can retry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    #[error("Idempotency store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store with set-if-absent semantics and per-entry expiry.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Store `value` under `key` unless a live entry exists. Returns `true`
    /// when this call created the entry.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, IdempotencyError>;

    async fn get(&self, key: &str) -> Result<Option<String>, IdempotencyError>;

    async fn delete(&self, key: &str) -> Result<(), IdempotencyError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Suitable for tests and single-instance deployments.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|(_, exp)| *exp > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, IdempotencyError> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), (value.to_string(), now + ttl));
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, IdempotencyError> {
        let now = Instant::now();
        Ok(self
            .lock()
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), IdempotencyError> {
        self.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Deliver-once helper
// ---------------------------------------------------------------------------

/// What [`deliver_once`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The claim was taken and the side effect succeeded.
    Sent,
    /// Another attempt already holds the claim; nothing was done.
    AlreadyClaimed,
    /// The side effect failed and the claim was released.
    Failed { reason: String, released: bool },
}

/// Claim `key`, run `send`, and release the claim if `send` fails.
///
/// Errors from the store while claiming are returned; a failure to release
/// after a failed send is reported through `released: false`.
pub async fn deliver_once<F, Fut, E>(
    store: &dyn IdempotencyStore,
    key: &str,
    ttl: Duration,
    send: F,
) -> Result<DeliveryOutcome, IdempotencyError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if !store.set_if_absent(key, "sent", ttl).await? {
        return Ok(DeliveryOutcome::AlreadyClaimed);
    }

    match send().await {
        Ok(()) => Ok(DeliveryOutcome::Sent),
        Err(e) => {
            let released = store.delete(key).await.is_ok();
            Ok(DeliveryOutcome::Failed {
                reason: e.to_string(),
                released,
            })
        }
    }
}
