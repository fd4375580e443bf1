//! Shared app builder, request helpers and fixtures for HTTP tests.

#![allow(dead_code)]

use std::sync::Arc;

use assessly_api::auth::jwt::{generate_access_token, JwtConfig};
use assessly_api::config::ServerConfig;
use assessly_api::router::build_app_router;
use assessly_api::state::AppState;
use assessly_core::status::TimeSpotStatus;
use assessly_core::types::{DbId, Timestamp};
use assessly_db::models::exam::{CreateExam, Exam};
use assessly_db::models::mentor::{CreateMentor, Mentor};
use assessly_db::models::time_spot::{MentorTimeSpot, NewTimeSpot};
use assessly_db::repositories::{ExamRepo, MentorRepo, TimeSpotRepo};
use assessly_events::{DisabledCalendar, LogOnlyNotifier};
use assessly_scheduling::SchedulingSettings;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret";
pub const FALLBACK_URL: &str = "https://meet.example/fallback";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        reminders_enabled: false,
        jwt: JwtConfig::new(JWT_SECRET),
    }
}

/// Build the full application router over `pool`.
///
/// The calendar is disabled, so every provisioned slot or booking carries
/// the fallback link; notifications are only logged.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let settings = SchedulingSettings {
        default_timezone: "UTC".into(),
        fallback_meet_url: FALLBACK_URL.into(),
    };
    let state = AppState::new(
        pool,
        config.clone(),
        Arc::new(DisabledCalendar),
        Arc::new(LogOnlyNotifier),
        settings,
    );
    build_app_router(state, &config)
}

pub fn token(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &JwtConfig::new(JWT_SECRET)).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 2030-09-01 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 9, 1, hour, minute, 0).unwrap()
}

pub async fn mentor(pool: &PgPool, user_id: DbId) -> Mentor {
    MentorRepo::create(
        pool,
        &CreateMentor {
            user_id,
            name: format!("Mentor {user_id}"),
            email: format!("mentor{user_id}@example.com"),
            timezone: Some("UTC".into()),
        },
    )
    .await
    .unwrap()
}

pub async fn exam(pool: &PgPool, candidate_user_id: DbId, name: &str) -> Exam {
    ExamRepo::create(
        pool,
        &CreateExam {
            candidate_user_id: Some(candidate_user_id),
            candidate_name: name.to_string(),
            candidate_email: format!("{}@example.com", name.to_lowercase()),
        },
    )
    .await
    .unwrap()
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
