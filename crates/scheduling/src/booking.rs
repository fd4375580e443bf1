//! Booking orchestration: bind mentors to interview requests.
//!
//! Both entry points follow the same two phases. The authoritative writes
//! (request status, bound spot, booking row, exam flag) happen in a single
//! transaction. Calendar and notification work for the new bindings runs
//! after commit via [`enrich_interview`] and cannot undo them.

use std::collections::HashSet;
use std::sync::Arc;

use assessly_core::calendar::CalendarGateway;
use assessly_core::clock::Clock;
use assessly_core::error::{join_ids, CoreError};
use assessly_core::interview::{
    can_transition, normalize_request_ids, validate_interval, validate_transition,
    SelfServiceBookingRequest,
};
use assessly_core::notify::NotificationGateway;
use assessly_core::slots::parse_timezone;
use assessly_core::status::{InterviewRequestStatus, TimeSpotStatus};
use assessly_core::types::DbId;
use assessly_db::is_unique_violation;
use assessly_db::models::booking::MentorBooking;
use assessly_db::models::interview_request::InterviewRequest;
use assessly_db::models::time_spot::{MentorTimeSpot, NewTimeSpot};
use assessly_db::repositories::{
    ExamRepo, InterviewRequestRepo, MentorBookingRepo, MentorRepo, TimeSpotRepo,
};
use assessly_db::DbPool;

use crate::enrichment::enrich_interview;
use crate::error::SchedulingError;
use crate::selection::MentorSelectionPolicy;
use crate::settings::SchedulingSettings;

/// Result of assigning a mentor to interview requests.
#[derive(Debug, Clone)]
pub enum AssignmentOutcome {
    /// Bookings created by this call, in request id order.
    Created(Vec<MentorBooking>),
    /// Every request was already booked; nothing changed.
    NothingToDo,
}

impl AssignmentOutcome {
    pub fn bookings(&self) -> &[MentorBooking] {
        match self {
            Self::Created(bookings) => bookings,
            Self::NothingToDo => &[],
        }
    }
}

/// Rows written by a self-service booking.
#[derive(Debug, Clone)]
pub struct SelfServiceBooking {
    pub interview_request: InterviewRequest,
    pub spot: MentorTimeSpot,
    pub booking: MentorBooking,
}

pub struct BookingOrchestrator {
    pool: DbPool,
    calendar: Arc<dyn CalendarGateway>,
    notifier: Arc<dyn NotificationGateway>,
    selection: Arc<dyn MentorSelectionPolicy>,
    clock: Arc<dyn Clock>,
    settings: SchedulingSettings,
}

impl BookingOrchestrator {
    pub fn new(
        pool: DbPool,
        calendar: Arc<dyn CalendarGateway>,
        notifier: Arc<dyn NotificationGateway>,
        selection: Arc<dyn MentorSelectionPolicy>,
        clock: Arc<dyn Clock>,
        settings: SchedulingSettings,
    ) -> Self {
        Self {
            pool,
            calendar,
            notifier,
            selection,
            clock,
            settings,
        }
    }

    /// Create the pending interview request for an exam, or return the
    /// existing one. The flag is `true` when this call created it.
    pub async fn create_interview_request(
        &self,
        exam_id: DbId,
    ) -> Result<(InterviewRequest, bool), SchedulingError> {
        ExamRepo::find_by_id(&self.pool, exam_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Exam",
                id: exam_id,
            })?;
        let (request, created) = InterviewRequestRepo::upsert_pending(&self.pool, exam_id).await?;
        if created {
            tracing::info!(exam_id, interview_request_id = request.id, "Interview request created");
        }
        Ok((request, created))
    }

    /// Assign `mentor_id` to the given interview requests.
    ///
    /// All ids must exist or the call is rejected naming the missing ones.
    /// Requests that already have an active booking are skipped. Each
    /// remaining request is bound to one of the mentor's earliest free
    /// future spots; if there are not enough, nothing is assigned.
    pub async fn assign_mentor(
        &self,
        mentor_id: DbId,
        interview_request_ids: &[DbId],
    ) -> Result<AssignmentOutcome, SchedulingError> {
        let ids = normalize_request_ids(interview_request_ids)?;

        MentorRepo::find_by_id(&self.pool, mentor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Mentor",
                id: mentor_id,
            })?;

        let existing: HashSet<DbId> = InterviewRequestRepo::find_existing_ids(&self.pool, &ids)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<DbId> = ids.iter().copied().filter(|id| !existing.contains(id)).collect();
        if !missing.is_empty() {
            return Err(CoreError::Conflict(format!(
                "Interview requests not found: {}",
                join_ids(&missing)
            ))
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let already_booked: HashSet<DbId> =
            MentorBookingRepo::find_active_by_requests(&mut *tx, &ids)
                .await?
                .into_iter()
                .map(|b| b.interview_request_id)
                .collect();
        let candidates: Vec<DbId> = ids
            .iter()
            .copied()
            .filter(|id| !already_booked.contains(id))
            .collect();

        let locked = if candidates.is_empty() {
            Vec::new()
        } else {
            InterviewRequestRepo::lock_by_ids(&mut *tx, &candidates).await?
        };
        let mut pending = Vec::with_capacity(locked.len());
        for request in locked {
            if can_transition(request_status(&request)?, InterviewRequestStatus::Assigned) {
                pending.push(request);
            } else {
                tracing::debug!(
                    interview_request_id = request.id,
                    "Interview request is not pending, skipped"
                );
            }
        }

        if pending.is_empty() {
            tx.rollback().await?;
            tracing::debug!(mentor_id, requested = ids.len(), "All interview requests already assigned");
            return Ok(AssignmentOutcome::NothingToDo);
        }

        let spots = TimeSpotRepo::claim_free_for_mentor(
            &mut *tx,
            mentor_id,
            self.clock.now(),
            pending.len() as i64,
        )
        .await?;
        if spots.len() < pending.len() {
            let unbound: Vec<DbId> = pending[spots.len()..].iter().map(|r| r.id).collect();
            return Err(CoreError::Conflict(format!(
                "Not enough free slots to bind interview requests: {}",
                join_ids(&unbound)
            ))
            .into());
        }

        let mut bookings = Vec::with_capacity(pending.len());
        for (request, spot) in pending.iter().zip(&spots) {
            InterviewRequestRepo::assign(&mut *tx, request.id, spot.id)
                .await?
                .ok_or_else(|| {
                    CoreError::Conflict(format!(
                        "Interview request {} is no longer pending",
                        request.id
                    ))
                })?;
            let booking = MentorBookingRepo::create(&mut *tx, mentor_id, request.id)
                .await
                .map_err(|e| booking_conflict(e, request.id))?;
            ExamRepo::mark_interview_scheduled(&mut *tx, request.exam_id).await?;
            bookings.push(booking);
        }

        tx.commit().await?;

        tracing::info!(
            mentor_id,
            created = bookings.len(),
            skipped = ids.len() - bookings.len(),
            "Mentor assigned to interview requests"
        );

        let assigned: Vec<DbId> = bookings.iter().map(|b| b.interview_request_id).collect();
        self.enrich(&assigned).await;

        Ok(AssignmentOutcome::Created(bookings))
    }

    /// Book an interview for `exam_id` at a candidate-chosen interval.
    ///
    /// Creates the request, a booked spot for the selected mentor, the
    /// binding and the booking, and flags the exam, all in one transaction.
    pub async fn book_self_service(
        &self,
        exam_id: DbId,
        input: &SelfServiceBookingRequest,
    ) -> Result<SelfServiceBooking, SchedulingError> {
        let duration_minutes = validate_interval(input.start_at, input.end_at)?;
        if input.start_at <= self.clock.now() {
            return Err(CoreError::Validation("startAt: must be in the future".into()).into());
        }
        let timezone = input
            .timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
            .unwrap_or(self.settings.default_timezone.as_str())
            .to_string();
        parse_timezone(&timezone)?;

        ExamRepo::find_by_id(&self.pool, exam_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Exam",
                id: exam_id,
            })?;
        if InterviewRequestRepo::find_by_exam(&self.pool, exam_id)
            .await?
            .is_some()
        {
            return Err(already_requested(exam_id).into());
        }

        let mentor = self
            .selection
            .select(&self.pool, input.start_at, input.end_at)
            .await?
            .ok_or_else(|| CoreError::Conflict("No active mentor is available".into()))?;

        let mut tx = self.pool.begin().await?;

        MentorRepo::lock(&mut *tx, mentor.id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Mentor",
                id: mentor.id,
            })?;
        if TimeSpotRepo::has_booked_overlap(&mut *tx, mentor.id, input.start_at, input.end_at)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "Mentor {} already has a booking overlapping the requested time",
                mentor.id
            ))
            .into());
        }

        let request = InterviewRequestRepo::insert_pending(&mut *tx, exam_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "uq_interview_requests_exam_id") {
                    SchedulingError::Core(already_requested(exam_id))
                } else {
                    e.into()
                }
            })?;

        let new_spot = NewTimeSpot {
            mentor_id: mentor.id,
            start_at: input.start_at,
            end_at: input.end_at,
            duration_minutes,
            timezone,
            status_id: TimeSpotStatus::Booked.id(),
            meet_url: None,
            calendar_event_id: None,
        };
        let spot = TimeSpotRepo::upsert_booked(&mut *tx, &new_spot)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict("The requested start time is already booked".into())
            })?;

        validate_transition(request_status(&request)?, InterviewRequestStatus::Assigned)?;
        let interview_request = InterviewRequestRepo::assign(&mut *tx, request.id, spot.id)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!("Interview request {} is no longer pending", request.id))
            })?;
        let booking = MentorBookingRepo::create(&mut *tx, mentor.id, request.id)
            .await
            .map_err(|e| booking_conflict(e, request.id))?;
        ExamRepo::mark_interview_scheduled(&mut *tx, exam_id).await?;

        tx.commit().await?;

        tracing::info!(
            exam_id,
            mentor_id = mentor.id,
            interview_request_id = interview_request.id,
            spot_id = spot.id,
            "Self-service interview booked"
        );

        self.enrich(&[interview_request.id]).await;

        Ok(SelfServiceBooking {
            interview_request,
            spot,
            booking,
        })
    }

    /// Post-commit calendar and notification work for assigned requests.
    async fn enrich(&self, interview_request_ids: &[DbId]) {
        let contexts = match InterviewRequestRepo::load_contexts(&self.pool, interview_request_ids).await {
            Ok(contexts) => contexts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load interviews for enrichment");
                return;
            }
        };
        for ctx in &contexts {
            enrich_interview(
                &self.pool,
                self.calendar.as_ref(),
                self.notifier.as_ref(),
                &self.settings.fallback_meet_url,
                ctx,
            )
            .await;
        }
    }
}

fn request_status(request: &InterviewRequest) -> Result<InterviewRequestStatus, CoreError> {
    request.status().ok_or_else(|| {
        CoreError::Internal(format!(
            "Interview request {} has unknown status id {}",
            request.id, request.status_id
        ))
    })
}

fn already_requested(exam_id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "An interview request already exists for exam {exam_id}"
    ))
}

fn booking_conflict(err: sqlx::Error, interview_request_id: DbId) -> SchedulingError {
    if is_unique_violation(&err, "uq_mentor_bookings_active_request") {
        CoreError::Conflict(format!(
            "Interview request {interview_request_id} already has an active booking"
        ))
        .into()
    } else {
        err.into()
    }
}
