//! Integration tests for mentor assignment and self-service booking.

mod common;

use assert_matches::assert_matches;
use assessly_core::error::CoreError;
use assessly_core::interview::SelfServiceBookingRequest;
use assessly_core::notify::TemplateKind;
use assessly_core::status::{InterviewRequestStatus, MentorBookingStatus, TimeSpotStatus};
use assessly_db::repositories::{
    ExamRepo, InterviewRequestRepo, MentorBookingRepo, MentorRepo, TimeSpotRepo,
};
use assessly_scheduling::{AssignmentOutcome, SchedulingError};
use chrono::Duration;
use common::*;
use sqlx::PgPool;

fn self_service(hour: u32, minute: u32) -> SelfServiceBookingRequest {
    SelfServiceBookingRequest {
        start_at: at(hour, minute),
        end_at: at(hour, minute) + Duration::minutes(45),
        timezone: None,
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn assignment_binds_earliest_free_spots(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(10, 0), at(9, 0), at(7, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let r2 = pending_request(&pool, "Bob").await;
    let calendar = FakeCalendar::new();
    let notifier = FakeNotifier::new();

    let outcome = orchestrator(&pool, calendar.clone(), notifier.clone())
        .assign_mentor(m.id, &[r1, r2])
        .await
        .unwrap();

    let bookings = outcome.bookings();
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b.mentor_id == m.id));

    let first = InterviewRequestRepo::find_by_id(&pool, r1).await.unwrap().unwrap();
    assert_eq!(first.status(), Some(InterviewRequestStatus::Assigned));
    let spot = TimeSpotRepo::find_by_id(&pool, first.current_spot_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(spot.start_at, at(9, 0));
    assert!(spot.is_booked());
    assert!(spot.calendar_event_id.is_some());

    let exam = ExamRepo::find_by_id(&pool, first.exam_id).await.unwrap().unwrap();
    assert!(exam.interview_scheduled);
    assert_eq!(calendar.created_count(), 2);
    assert_eq!(notifier.sent_count(TemplateKind::InterviewScheduled), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn already_booked_request_is_skipped(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0), at(10, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let r2 = pending_request(&pool, "Bob").await;
    let service = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());

    service.assign_mentor(m.id, &[r1]).await.unwrap();
    let outcome = service.assign_mentor(m.id, &[r1, r2]).await.unwrap();

    let bookings = outcome.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].interview_request_id, r2);
    assert_eq!(booking_count(&pool, r1).await, 1);
    assert_eq!(booking_count(&pool, r2).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_assignment_is_nothing_to_do(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0), at(10, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let service = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());

    assert_matches!(
        service.assign_mentor(m.id, &[r1]).await.unwrap(),
        AssignmentOutcome::Created(b) if b.len() == 1
    );
    assert_matches!(
        service.assign_mentor(m.id, &[r1, r1]).await.unwrap(),
        AssignmentOutcome::NothingToDo
    );
    assert_eq!(booking_count(&pool, r1).await, 1);
    assert_eq!(MentorBookingRepo::list_by_request(&pool, r1).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_ids_reject_the_whole_call(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .assign_mentor(m.id, &[r1, 4242])
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(msg)) if msg.contains("4242"));
    assert_eq!(booking_count(&pool, r1).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn not_enough_free_spots_assigns_nothing(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0)], TimeSpotStatus::Available).await;
    // Past spots are never bound.
    spots(&pool, m.id, &[at(7, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let r2 = pending_request(&pool, "Bob").await;

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .assign_mentor(m.id, &[r1, r2])
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(msg)) if msg.contains(&r2.to_string()));
    assert_eq!(booking_count(&pool, r1).await, 0);
    let free = TimeSpotRepo::find_for_mentor_by_starts(&pool, m.id, &[at(9, 0)])
        .await
        .unwrap();
    assert_eq!(free[0].status(), Some(TimeSpotStatus::Available));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn calendar_outage_does_not_undo_assignment(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let notifier = FakeNotifier::new();
    notifier.set_failing(true);

    let outcome = orchestrator(&pool, FakeCalendar::failing(), notifier.clone())
        .assign_mentor(m.id, &[r1])
        .await
        .unwrap();

    assert_eq!(outcome.bookings().len(), 1);
    let request = InterviewRequestRepo::find_by_id(&pool, r1).await.unwrap().unwrap();
    assert_eq!(request.status(), Some(InterviewRequestStatus::Assigned));
    let spot = TimeSpotRepo::find_by_id(&pool, request.current_spot_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(spot.meet_url.as_deref(), Some(FALLBACK_URL));
    assert!(spot.calendar_event_id.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_assignments_book_once(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0), at(10, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let a = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());
    let b = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());

    let ids = [r1];
    let (ra, rb) = tokio::join!(a.assign_mentor(m.id, &ids), b.assign_mentor(m.id, &ids));

    let created = ra.unwrap().bookings().len() + rb.unwrap().bookings().len();
    assert_eq!(created, 1);
    assert_eq!(booking_count(&pool, r1).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assigned_request_with_finished_booking_is_not_reassigned(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 0), at(10, 0)], TimeSpotStatus::Available).await;
    let r1 = pending_request(&pool, "Alice").await;
    let service = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());
    service.assign_mentor(m.id, &[r1]).await.unwrap();

    sqlx::query("UPDATE mentor_bookings SET status_id = $1 WHERE interview_request_id = $2")
        .bind(MentorBookingStatus::Completed.id())
        .bind(r1)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = service.assign_mentor(m.id, &[r1]).await.unwrap();
    assert_matches!(outcome, AssignmentOutcome::NothingToDo);
    assert_eq!(booking_count(&pool, r1).await, 1);
    let free: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mentor_time_spots WHERE mentor_id = $1 AND status_id = $2",
    )
    .bind(m.id)
    .bind(TimeSpotStatus::Available.id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(free, 1);
}

// ---------------------------------------------------------------------------
// Self-service
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_writes_everything_atomically(pool: PgPool) {
    let oldest = mentor(&pool, 1).await;
    mentor(&pool, 2).await;
    let exam = exam(&pool, "Alice").await;
    let notifier = FakeNotifier::new();

    let booked = orchestrator(&pool, FakeCalendar::new(), notifier.clone())
        .book_self_service(exam.id, &self_service(9, 0))
        .await
        .unwrap();

    assert_eq!(booked.booking.mentor_id, oldest.id);
    assert_eq!(booked.spot.mentor_id, oldest.id);
    assert_eq!(booked.spot.duration_minutes, 45);
    assert!(booked.spot.is_booked());
    assert_eq!(booked.interview_request.current_spot_id, Some(booked.spot.id));
    assert_eq!(
        booked.interview_request.status(),
        Some(InterviewRequestStatus::Assigned)
    );
    let exam = ExamRepo::find_by_id(&pool, exam.id).await.unwrap().unwrap();
    assert!(exam.interview_scheduled);
    assert_eq!(notifier.sent_count(TemplateKind::InterviewScheduled), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_rejects_second_request_for_exam(pool: PgPool) {
    mentor(&pool, 1).await;
    let exam = exam(&pool, "Alice").await;
    InterviewRequestRepo::upsert_pending(&pool, exam.id).await.unwrap();

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .book_self_service(exam.id, &self_service(9, 0))
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_rejects_inverted_interval(pool: PgPool) {
    mentor(&pool, 1).await;
    let exam = exam(&pool, "Alice").await;
    let mut input = self_service(9, 0);
    input.end_at = input.start_at;

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .book_self_service(exam.id, &input)
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Validation(_)));
    assert!(InterviewRequestRepo::find_by_exam(&pool, exam.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_needs_an_active_mentor(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    MentorRepo::set_active(&pool, m.id, false).await.unwrap();
    let exam = exam(&pool, "Alice").await;

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .book_self_service(exam.id, &self_service(9, 0))
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(msg)) if msg.contains("mentor"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_rejects_overlap_and_rolls_back(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    spots(&pool, m.id, &[at(9, 30)], TimeSpotStatus::Booked).await;
    let exam = exam(&pool, "Alice").await;

    let err = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new())
        .book_self_service(exam.id, &self_service(9, 0))
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(_)));
    assert!(InterviewRequestRepo::find_by_exam(&pool, exam.id).await.unwrap().is_none());
    assert_eq!(mentor_spot_count(&pool, m.id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_overlapping_self_service_books_once(pool: PgPool) {
    let m = mentor(&pool, 1).await;
    let alice = exam(&pool, "Alice").await;
    let bob = exam(&pool, "Bob").await;
    let a = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());
    let b = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());

    // 09:00-09:45 and 09:30-10:15 overlap but start at different instants.
    let (first, second) = (self_service(9, 0), self_service(9, 30));
    let (ra, rb) = tokio::join!(
        a.book_self_service(alice.id, &first),
        b.book_self_service(bob.id, &second)
    );

    assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
    let err = ra.err().or(rb.err()).unwrap();
    assert_matches!(err, SchedulingError::Core(CoreError::Conflict(_)));

    let booked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mentor_time_spots WHERE mentor_id = $1 AND status_id = $2",
    )
    .bind(m.id)
    .bind(TimeSpotStatus::Booked.id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(booked, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_interview_request_is_an_upsert(pool: PgPool) {
    let exam = exam(&pool, "Alice").await;
    let service = orchestrator(&pool, FakeCalendar::new(), FakeNotifier::new());

    let (first, created) = service.create_interview_request(exam.id).await.unwrap();
    let (second, created_again) = service.create_interview_request(exam.id).await.unwrap();

    assert!(created);
    assert!(!created_again);
    assert_eq!(first.id, second.id);
    assert_eq!(first.status(), Some(InterviewRequestStatus::Pending));
    assert_matches!(
        service.create_interview_request(9999).await,
        Err(SchedulingError::Core(CoreError::NotFound { entity: "Exam", .. }))
    );
}
