//! Shared fixtures and gateway fakes for scheduling integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assessly_core::calendar::{
    CalendarError, CalendarEvent, CalendarEventRequest, CalendarGateway, Participant,
};
use assessly_core::clock::FixedClock;
use assessly_core::notify::{NotificationError, NotificationGateway, TemplateKind};
use assessly_core::reconcile::ConflictPolicy;
use assessly_core::slots::{AvailabilityDay, BulkSlotRequest, TimeRangeInput};
use assessly_core::status::TimeSpotStatus;
use assessly_core::types::{DbId, Timestamp};
use assessly_db::models::exam::{CreateExam, Exam};
use assessly_db::models::mentor::{CreateMentor, Mentor};
use assessly_db::models::time_spot::{MentorTimeSpot, NewTimeSpot};
use assessly_db::repositories::{ExamRepo, InterviewRequestRepo, MentorRepo, TimeSpotRepo};
use assessly_scheduling::{
    BookingOrchestrator, OldestActiveMentor, SchedulingSettings, SlotReconciler,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;

pub const FALLBACK_URL: &str = "https://meet.example/fallback";

/// 2030-09-01 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 9, 1, hour, minute, 0).unwrap()
}

/// The fixed "now" used by booking and reminder tests.
pub fn now() -> Timestamp {
    at(8, 0)
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now()))
}

pub fn settings() -> SchedulingSettings {
    SchedulingSettings {
        default_timezone: "UTC".into(),
        fallback_meet_url: FALLBACK_URL.into(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn mentor(pool: &PgPool, user_id: DbId) -> Mentor {
    MentorRepo::create(
        pool,
        &CreateMentor {
            user_id,
            name: format!("Mentor {user_id}"),
            email: format!("mentor{user_id}@example.com"),
            timezone: None,
        },
    )
    .await
    .unwrap()
}

pub async fn exam(pool: &PgPool, name: &str) -> Exam {
    ExamRepo::create(
        pool,
        &CreateExam {
            candidate_user_id: None,
            candidate_name: name.to_string(),
            candidate_email: format!("{}@example.com", name.to_lowercase()),
        },
    )
    .await
    .unwrap()
}

/// A pending interview request for a fresh exam.
pub async fn pending_request(pool: &PgPool, name: &str) -> DbId {
    let exam = exam(pool, name).await;
    InterviewRequestRepo::upsert_pending(pool, exam.id)
        .await
        .unwrap()
        .0
        .id
}

/// Insert 30-minute spots starting at each of `starts`.
pub async fn spots(
    pool: &PgPool,
    mentor_id: DbId,
    starts: &[Timestamp],
    status: TimeSpotStatus,
) -> Vec<MentorTimeSpot> {
    let rows: Vec<NewTimeSpot> = starts
        .iter()
        .map(|start| NewTimeSpot {
            mentor_id,
            start_at: *start,
            end_at: *start + Duration::minutes(30),
            duration_minutes: 30,
            timezone: "UTC".into(),
            status_id: status.id(),
            meet_url: Some(FALLBACK_URL.into()),
            calendar_event_id: None,
        })
        .collect();
    let mut conn = pool.acquire().await.unwrap();
    TimeSpotRepo::insert_skip_duplicates(&mut conn, &rows)
        .await
        .unwrap()
}

pub async fn mentor_spot_count(pool: &PgPool, mentor_id: DbId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mentor_time_spots WHERE mentor_id = $1")
        .bind(mentor_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn booking_count(pool: &PgPool, interview_request_id: DbId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM mentor_bookings WHERE interview_request_id = $1")
        .bind(interview_request_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Availability on 2030-09-01 for the given `HH:mm` ranges.
pub fn bulk_request(ranges: &[(&str, &str)], duration: i32, policy: ConflictPolicy) -> BulkSlotRequest {
    BulkSlotRequest {
        timezone: Some("UTC".into()),
        duration_min: Some(duration),
        buffer_minutes: None,
        default_status: None,
        availabilities: vec![AvailabilityDay {
            date: "2030-09-01".into(),
            ranges: ranges
                .iter()
                .map(|(start, end)| TimeRangeInput {
                    start: start.to_string(),
                    end: end.to_string(),
                })
                .collect(),
        }],
        deleted_slot_ids: Vec::new(),
        conflict_policy: policy,
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

pub fn reconciler(pool: &PgPool, calendar: Arc<FakeCalendar>) -> SlotReconciler {
    SlotReconciler::new(pool.clone(), calendar, settings())
}

pub fn orchestrator(
    pool: &PgPool,
    calendar: Arc<FakeCalendar>,
    notifier: Arc<FakeNotifier>,
) -> BookingOrchestrator {
    BookingOrchestrator::new(
        pool.clone(),
        calendar,
        notifier,
        Arc::new(OldestActiveMentor),
        clock(),
        settings(),
    )
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Calendar that records calls and can be switched to fail creates.
#[derive(Default)]
pub struct FakeCalendar {
    next_id: AtomicUsize,
    fail_creates: AtomicBool,
    book_on_create: Mutex<Option<(PgPool, DbId)>>,
    pub created: Mutex<Vec<CalendarEventRequest>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeCalendar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let calendar = Self::default();
        calendar.fail_creates.store(true, Ordering::SeqCst);
        Arc::new(calendar)
    }

    /// Mark `spot_id` booked during the next create, as a concurrent
    /// booking would.
    pub fn book_spot_on_create(&self, pool: &PgPool, spot_id: DbId) {
        *self.book_on_create.lock().unwrap() = Some((pool.clone(), spot_id));
    }

    /// Deleted event ids, sorted.
    pub fn deleted_sorted(&self) -> Vec<String> {
        let mut ids = self.deleted_ids();
        ids.sort();
        ids
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarGateway for FakeCalendar {
    async fn create_event(
        &self,
        request: &CalendarEventRequest,
    ) -> Result<CalendarEvent, CalendarError> {
        let book = self.book_on_create.lock().unwrap().take();
        if let Some((pool, spot_id)) = book {
            sqlx::query("UPDATE mentor_time_spots SET status_id = $1 WHERE id = $2")
                .bind(TimeSpotStatus::Booked.id())
                .bind(spot_id)
                .execute(&pool)
                .await
                .unwrap();
        }
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(CalendarError::HttpStatus(503));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().unwrap().push(request.clone());
        Ok(CalendarEvent {
            event_id: format!("evt-{n}"),
            join_url: format!("https://meet.example/evt-{n}"),
        })
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}

/// Notifier that records sends and can be switched to fail.
#[derive(Default)]
pub struct FakeNotifier {
    failing: AtomicBool,
    pub sent: Mutex<Vec<(String, TemplateKind, serde_json::Value)>>,
}

impl FakeNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_count(&self, kind: TemplateKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl NotificationGateway for FakeNotifier {
    async fn send(
        &self,
        recipient: &Participant,
        kind: TemplateKind,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("smtp unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.email.clone(), kind, data.clone()));
        Ok(())
    }
}
