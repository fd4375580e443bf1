//! HTTP tests for interview scheduling under `/api/v1/exams/{exam_id}`.

mod common;

use assessly_core::roles::{ROLE_ADMIN, ROLE_CANDIDATE};
use assessly_core::status::{InterviewRequestStatus, TimeSpotStatus};
use axum::http::StatusCode;
use common::{body_json, post_json_auth, token, FALLBACK_URL};
use serde_json::json;
use sqlx::PgPool;

fn slot_body() -> serde_json::Value {
    json!({
        "startAt": "2030-09-02T10:00:00Z",
        "endAt": "2030-09-02T10:45:00Z",
        "timezone": "Europe/Berlin"
    })
}

// ---------------------------------------------------------------------------
// Interview request upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_interview_request_is_an_upsert(pool: PgPool) {
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/exams/{}/interview-request", exam.id);
    let candidate = token(20, ROLE_CANDIDATE);

    let first = post_json_auth(app.clone(), &uri, json!({}), &candidate).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let created = body_json(first).await;
    assert_eq!(created["data"]["exam_id"], exam.id);
    assert_eq!(created["data"]["status_id"], InterviewRequestStatus::Pending.id());
    assert!(created["data"]["current_spot_id"].is_null());

    let second = post_json_auth(app, &uri, json!({}), &candidate).await;
    assert_eq!(second.status(), StatusCode::OK);
    let existing = body_json(second).await;
    assert_eq!(existing["data"]["id"], created["data"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_candidates_are_forbidden(pool: PgPool) {
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/exams/{}/interview-request", exam.id);
    let response = post_json_auth(app, &uri, json!({}), &token(21, ROLE_CANDIDATE)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_exam_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/exams/424242/interview-request",
        json!({}),
        &token(1, ROLE_ADMIN),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Self-service booking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_service_booking_creates_booked_spot(pool: PgPool) {
    let mentor = common::mentor(&pool, 10).await;
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/exams/{}/interview/book", exam.id);
    let response = post_json_auth(app, &uri, slot_body(), &token(20, ROLE_CANDIDATE)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["spot"]["mentor_id"], mentor.id);
    assert_eq!(data["spot"]["status_id"], TimeSpotStatus::Booked.id());
    assert_eq!(data["spot"]["duration_minutes"], 45);
    assert_eq!(data["spot"]["timezone"], "Europe/Berlin");
    assert_eq!(data["spot"]["meet_url"], FALLBACK_URL);
    assert_eq!(
        data["interview_request"]["status_id"],
        InterviewRequestStatus::Assigned.id()
    );
    assert_eq!(data["interview_request"]["current_spot_id"], data["spot"]["id"]);
    assert_eq!(data["booking"]["mentor_id"], mentor.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_booking_for_the_same_exam_is_a_conflict(pool: PgPool) {
    common::mentor(&pool, 10).await;
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/exams/{}/interview/book", exam.id);
    let candidate = token(20, ROLE_CANDIDATE);

    let first = post_json_auth(app.clone(), &uri, slot_body(), &candidate).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let body = json!({
        "startAt": "2030-09-03T10:00:00Z",
        "endAt": "2030-09-03T10:30:00Z"
    });
    let second = post_json_auth(app, &uri, body, &candidate).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inverted_interval_is_a_validation_error(pool: PgPool) {
    common::mentor(&pool, 10).await;
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);

    let body = json!({
        "startAt": "2030-09-02T11:00:00Z",
        "endAt": "2030-09-02T10:00:00Z"
    });
    let uri = format!("/api/v1/exams/{}/interview/book", exam.id);
    let response = post_json_auth(app, &uri, body, &token(20, ROLE_CANDIDATE)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn booking_without_active_mentor_is_a_conflict(pool: PgPool) {
    let exam = common::exam(&pool, 20, "Ada").await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/exams/{}/interview/book", exam.id);
    let response = post_json_auth(app, &uri, slot_body(), &token(1, ROLE_ADMIN)).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
