//! Calendar event provisioning over HTTP.
//!
//! [`HttpCalendarGateway`] talks to a JSON calendar service:
//!
//! - `POST {base}/events` with the event request, answering
//!   `{ "id": "...", "join_url": "..." }`
//! - `DELETE {base}/events/{id}`, where `404` counts as already deleted
//!
//! Transport failures and 5xx answers are retried with a short backoff.
//! [`DisabledCalendar`] is used when no service is configured; it fails every
//! create so callers fall back to a placeholder link.

use std::time::Duration;

use assessly_core::calendar::{
    CalendarError, CalendarEvent, CalendarEventRequest, CalendarGateway,
};
use async_trait::async_trait;
use serde::Deserialize;

/// Backoff between attempts; one attempt per entry plus a final one.
const RETRY_DELAYS_MS: [u64; 2] = [250, 1000];

/// HTTP request timeout for a single attempt.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// CalendarConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Base URL of the calendar service, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub retry_delays: Vec<Duration>,
}

impl CalendarConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            retry_delays: RETRY_DELAYS_MS.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `CALENDAR_API_URL` is not set.
    ///
    /// | Variable             | Required | Default |
    /// |----------------------|----------|---------|
    /// | `CALENDAR_API_URL`   | yes      | -       |
    /// | `CALENDAR_API_TOKEN` | no       | -       |
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CALENDAR_API_URL").ok().filter(|u| !u.is_empty())?;
        let mut config = Self::new(base_url);
        config.api_token = std::env::var("CALENDAR_API_TOKEN").ok().filter(|t| !t.is_empty());
        Some(config)
    }
}

// ---------------------------------------------------------------------------
// HttpCalendarGateway
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
    #[serde(alias = "joinUrl")]
    join_url: String,
}

pub struct HttpCalendarGateway {
    client: reqwest::Client,
    config: CalendarConfig,
}

impl HttpCalendarGateway {
    pub fn new(config: CalendarConfig) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CalendarError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Run `attempt` until it succeeds or fails with a non-retryable error,
    /// sleeping through the configured backoff in between.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut attempt: F) -> Result<T, CalendarError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CalendarError>>,
    {
        for (n, delay) in self.config.retry_delays.iter().enumerate() {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(attempt = n + 1, operation = what, error = %e, "Calendar request failed, retrying");
                    tokio::time::sleep(*delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        attempt().await
    }

    async fn try_create(&self, request: &CalendarEventRequest) -> Result<CalendarEvent, CalendarError> {
        let url = format!("{}/events", self.config.base_url);
        let response = self
            .authorize(self.client.post(&url).json(request))
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::HttpStatus(status.as_u16()));
        }

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::InvalidResponse(e.to_string()))?;
        if created.id.is_empty() || created.join_url.is_empty() {
            return Err(CalendarError::InvalidResponse(
                "missing event id or join url".into(),
            ));
        }
        Ok(CalendarEvent {
            event_id: created.id,
            join_url: created.join_url,
        })
    }

    async fn try_delete(&self, event_id: &str) -> Result<(), CalendarError> {
        let url = format!("{}/events/{event_id}", self.config.base_url);
        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(CalendarError::HttpStatus(status.as_u16()))
    }
}

fn is_retryable(err: &CalendarError) -> bool {
    match err {
        CalendarError::Transport(_) => true,
        CalendarError::HttpStatus(code) => *code >= 500 || *code == 429,
        CalendarError::NotConfigured | CalendarError::InvalidResponse(_) => false,
    }
}

#[async_trait]
impl CalendarGateway for HttpCalendarGateway {
    async fn create_event(
        &self,
        request: &CalendarEventRequest,
    ) -> Result<CalendarEvent, CalendarError> {
        let event = self.with_retry("create", || self.try_create(request)).await?;
        tracing::debug!(event_id = %event.event_id, "Calendar event created");
        Ok(event)
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.with_retry("delete", || self.try_delete(event_id)).await?;
        tracing::debug!(event_id, "Calendar event deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DisabledCalendar
// ---------------------------------------------------------------------------

/// Stand-in used when no calendar service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCalendar;

#[async_trait]
impl CalendarGateway for DisabledCalendar {
    async fn create_event(
        &self,
        _request: &CalendarEventRequest,
    ) -> Result<CalendarEvent, CalendarError> {
        Err(CalendarError::NotConfigured)
    }

    /// Nothing was ever created, so there is nothing to delete.
    async fn delete_event(&self, _event_id: &str) -> Result<(), CalendarError> {
        Ok(())
    }
}
