//! Pure planning for slot reconciliation.
//!
//! Given generated candidates and the persisted spots that share their start
//! instants, decide what to create, what to replace and what to leave alone.
//! The `scheduling` crate applies the resulting plan inside a transaction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{join_ids, CoreError};
use crate::slots::SlotCandidate;
use crate::status::TimeSpotStatus;
use crate::types::{DbId, Timestamp};

/// How candidates colliding with an already persisted start time are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictPolicy {
    /// Keep the persisted spot, drop the candidate.
    #[default]
    Skip,
    /// Delete the persisted spot and create the candidate in its place.
    Replace,
    /// Reject the whole operation.
    Error,
}

/// The slice of a persisted spot the planner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSpot {
    pub id: DbId,
    pub start_at: Timestamp,
    pub status: TimeSpotStatus,
}

/// Outcome of [`plan_creation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationPlan {
    /// Candidates to insert.
    pub create: Vec<SlotCandidate>,
    /// Persisted spot ids to delete before inserting (REPLACE only).
    pub replace: Vec<DbId>,
    /// Candidates dropped because their start instant is already taken.
    pub skipped: usize,
}

/// Drop candidates whose `start_at` was already seen; the first occurrence wins.
pub fn dedupe_by_start(candidates: Vec<SlotCandidate>) -> Vec<SlotCandidate> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.start_at))
        .collect()
}

/// Decide which deduplicated candidates to create given the persisted spots
/// sharing their start instants.
///
/// Booked spots are never replaced: under REPLACE a candidate colliding with
/// a booked spot is skipped instead.
pub fn plan_creation(
    candidates: Vec<SlotCandidate>,
    existing: &[PersistedSpot],
    policy: ConflictPolicy,
) -> Result<CreationPlan, CoreError> {
    let by_start: HashMap<Timestamp, &PersistedSpot> =
        existing.iter().map(|s| (s.start_at, s)).collect();

    let conflicts = candidates
        .iter()
        .filter(|c| by_start.contains_key(&c.start_at))
        .count();

    if policy == ConflictPolicy::Error && conflicts > 0 {
        return Err(CoreError::Conflict(format!(
            "{conflicts} slot(s) already exist at the requested start times"
        )));
    }

    let mut plan = CreationPlan::default();
    for candidate in candidates {
        match (by_start.get(&candidate.start_at), policy) {
            (None, _) => plan.create.push(candidate),
            (Some(spot), ConflictPolicy::Replace) if spot.status != TimeSpotStatus::Booked => {
                plan.replace.push(spot.id);
                plan.create.push(candidate);
            }
            (Some(_), _) => plan.skipped += 1,
        }
    }

    Ok(plan)
}

/// Validate an explicit deletion list against the spots found for the mentor.
///
/// Ids that do not belong to the mentor were filtered out by the lookup and
/// are ignored. If any found spot is booked, the whole list is rejected.
pub fn check_deletable(found: &[PersistedSpot]) -> Result<Vec<DbId>, CoreError> {
    let booked: Vec<DbId> = found
        .iter()
        .filter(|s| s.status == TimeSpotStatus::Booked)
        .map(|s| s.id)
        .collect();

    if !booked.is_empty() {
        return Err(CoreError::Conflict(format!(
            "Cannot delete booked slots: {}",
            join_ids(&booked)
        )));
    }

    Ok(found.iter().map(|s| s.id).collect())
}
