//! Slot reconciliation: turn a bulk availability request into persisted
//! spots for one mentor.
//!
//! Phases:
//! 1. Generate and dedupe candidates, validate the deletion list and plan
//!    creation under the conflict policy. Any error here leaves storage and
//!    the calendar untouched.
//! 2. Provision a calendar event per candidate to create. Failures degrade
//!    to the fallback link.
//! 3. One transaction: lock the listed spots and reject the call if any of
//!    them became booked, delete the listed and replaced spots, insert the
//!    candidates skipping `(mentor_id, start_at)` duplicates.
//! 4. After commit, best-effort delete the calendar events of removed spots
//!    and of candidates a concurrent request already inserted. If the
//!    transaction fails, every event provisioned in phase 2 is deleted.

use std::collections::HashSet;
use std::sync::Arc;

use assessly_core::calendar::{provision, CalendarEventRequest, CalendarGateway, Provisioning};
use assessly_core::error::CoreError;
use assessly_core::reconcile::{check_deletable, dedupe_by_start, plan_creation, PersistedSpot};
use assessly_core::slots::{generate_slots, BulkSlotRequest, SlotCandidate};
use assessly_core::types::{DbId, Timestamp};
use assessly_db::models::mentor::Mentor;
use assessly_db::models::time_spot::{DeletedSpot, MentorTimeSpot, NewTimeSpot};
use assessly_db::repositories::{MentorRepo, TimeSpotRepo};
use assessly_db::DbPool;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::SchedulingError;
use crate::settings::SchedulingSettings;

/// Calendar calls in flight at once per reconciliation.
const CALENDAR_CONCURRENCY: usize = 4;

/// Counts reported for a bulk slot request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub deleted: usize,
}

pub struct SlotReconciler {
    pool: DbPool,
    calendar: Arc<dyn CalendarGateway>,
    settings: SchedulingSettings,
}

impl SlotReconciler {
    pub fn new(
        pool: DbPool,
        calendar: Arc<dyn CalendarGateway>,
        settings: SchedulingSettings,
    ) -> Self {
        Self {
            pool,
            calendar,
            settings,
        }
    }

    /// Apply `request` to the spots of `mentor_id`.
    pub async fn reconcile(
        &self,
        mentor_id: DbId,
        request: &BulkSlotRequest,
    ) -> Result<ReconcileOutcome, SchedulingError> {
        let mentor = MentorRepo::find_by_id(&self.pool, mentor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Mentor",
                id: mentor_id,
            })?;

        let default_timezone = if mentor.timezone.trim().is_empty() {
            self.settings.default_timezone.as_str()
        } else {
            mentor.timezone.as_str()
        };
        let candidates = dedupe_by_start(generate_slots(mentor.id, request, default_timezone)?);

        let to_delete = self
            .validate_deletions(mentor.id, &request.deleted_slot_ids)
            .await?;

        // Spots about to be deleted do not block candidates at their start.
        let starts: Vec<Timestamp> = candidates.iter().map(|c| c.start_at).collect();
        let existing: Vec<PersistedSpot> =
            TimeSpotRepo::find_for_mentor_by_starts(&self.pool, mentor.id, &starts)
                .await?
                .iter()
                .map(MentorTimeSpot::as_persisted)
                .filter(|s| !to_delete.contains(&s.id))
                .collect();

        let plan = plan_creation(candidates, &existing, request.conflict_policy)?;

        if plan.create.is_empty() && to_delete.is_empty() && plan.replace.is_empty() {
            tracing::debug!(mentor_id, skipped = plan.skipped, "Bulk slot request changed nothing");
            return Ok(ReconcileOutcome::default());
        }

        let new_spots = self.provision_all(&mentor, &plan.create).await;

        let (deleted, inserted) = match self
            .apply(mentor.id, &to_delete, &plan.replace, &new_spots)
            .await
        {
            Ok(applied) => applied,
            Err(e) => {
                let provisioned: Vec<String> = new_spots
                    .iter()
                    .filter_map(|s| s.calendar_event_id.clone())
                    .collect();
                if !provisioned.is_empty() {
                    tracing::warn!(
                        mentor_id,
                        count = provisioned.len(),
                        error = %e,
                        "Bulk slot write failed, removing provisioned calendar events"
                    );
                }
                self.delete_events(provisioned).await;
                return Err(e);
            }
        };

        // Events of removed spots, plus events provisioned for candidates
        // whose insert was absorbed as a duplicate.
        let inserted_starts: HashSet<Timestamp> = inserted.iter().map(|s| s.start_at).collect();
        let stale_events: Vec<String> = deleted
            .iter()
            .filter_map(|d| d.calendar_event_id.clone())
            .chain(
                new_spots
                    .iter()
                    .filter(|s| !inserted_starts.contains(&s.start_at))
                    .filter_map(|s| s.calendar_event_id.clone()),
            )
            .collect();
        self.delete_events(stale_events).await;

        let outcome = ReconcileOutcome {
            created: inserted.len(),
            deleted: deleted.len(),
        };
        tracing::info!(
            mentor_id,
            created = outcome.created,
            deleted = outcome.deleted,
            skipped = plan.skipped + (new_spots.len() - inserted.len()),
            "Bulk slot request applied"
        );
        Ok(outcome)
    }

    /// The authoritative writes, in one transaction.
    async fn apply(
        &self,
        mentor_id: DbId,
        to_delete: &[DbId],
        replace: &[DbId],
        new_spots: &[NewTimeSpot],
    ) -> Result<(Vec<DeletedSpot>, Vec<MentorTimeSpot>), SchedulingError> {
        let mut tx = self.pool.begin().await?;

        // A listed spot may have been booked since the first check.
        let locked: Vec<PersistedSpot> =
            TimeSpotRepo::lock_for_mentor_by_ids(&mut *tx, mentor_id, to_delete)
                .await?
                .iter()
                .map(MentorTimeSpot::as_persisted)
                .collect();
        check_deletable(&locked)?;

        let mut delete_ids = to_delete.to_vec();
        delete_ids.extend_from_slice(replace);

        let deleted = TimeSpotRepo::delete_unbooked(&mut *tx, mentor_id, &delete_ids).await?;
        let inserted = TimeSpotRepo::insert_skip_duplicates(&mut *tx, new_spots).await?;
        tx.commit().await?;
        Ok((deleted, inserted))
    }

    /// Resolve the deletion list to the mentor's spot ids, rejecting the
    /// whole list if any of them is booked.
    async fn validate_deletions(
        &self,
        mentor_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, SchedulingError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<PersistedSpot> =
            TimeSpotRepo::find_for_mentor_by_ids(&self.pool, mentor_id, ids)
                .await?
                .iter()
                .map(MentorTimeSpot::as_persisted)
                .collect();
        Ok(check_deletable(&found)?)
    }

    /// Provision a calendar event for each candidate, in candidate order.
    async fn provision_all(&self, mentor: &Mentor, candidates: &[SlotCandidate]) -> Vec<NewTimeSpot> {
        let fallback = self.settings.fallback_meet_url.as_str();
        let calendar = self.calendar.as_ref();

        let results: Vec<(NewTimeSpot, Option<String>)> = stream::iter(candidates.to_vec())
            .map(move |candidate| async move {
                let request = CalendarEventRequest {
                    summary: format!("Interview slot with {}", mentor.name),
                    organizer: mentor.participant(),
                    attendee: None,
                    start_at: candidate.start_at,
                    end_at: candidate.end_at,
                    timezone: candidate.timezone.clone(),
                };
                match provision(calendar, &request, fallback).await {
                    Provisioning::Ok(event) => (
                        NewTimeSpot::from_candidate(&candidate, Some(event.join_url), Some(event.event_id)),
                        None,
                    ),
                    Provisioning::Degraded { fallback_url, reason } => (
                        NewTimeSpot::from_candidate(&candidate, Some(fallback_url), None),
                        Some(reason),
                    ),
                }
            })
            .buffered(CALENDAR_CONCURRENCY)
            .collect()
            .await;

        let degraded: Vec<&String> = results.iter().filter_map(|(_, r)| r.as_ref()).collect();
        if let Some(first) = degraded.first() {
            tracing::warn!(
                mentor_id = mentor.id,
                count = degraded.len(),
                reason = %first,
                "Calendar provisioning failed, using fallback link"
            );
        }

        results.into_iter().map(|(spot, _)| spot).collect()
    }

    async fn delete_events(&self, event_ids: Vec<String>) {
        let calendar = self.calendar.as_ref();
        stream::iter(event_ids)
            .for_each_concurrent(CALENDAR_CONCURRENCY, |event_id| async move {
                if let Err(e) = calendar.delete_event(&event_id).await {
                    tracing::warn!(event_id = %event_id, error = %e, "Failed to delete calendar event");
                }
            })
            .await;
    }
}
