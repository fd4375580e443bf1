//! External calendar capability.
//!
//! The scheduling services only need two operations from a calendar
//! provider: create a meeting event (yielding an event id and a join link)
//! and delete an event by id. Provider adapters live in the `events` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// A person taking part in a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
}

/// Input for [`CalendarGateway::create_event`].
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub organizer: Participant,
    /// `None` while a slot is still unbooked.
    pub attendee: Option<Participant>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub timezone: String,
}

/// A created calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub join_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// No calendar provider is configured.
    #[error("Calendar integration is not configured")]
    NotConfigured,

    /// The provider could not be reached or timed out.
    #[error("Calendar request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Calendar provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The provider response could not be understood.
    #[error("Invalid calendar response: {0}")]
    InvalidResponse(String),
}

/// Calendar provider capability.
///
/// `delete_event` must treat an already-deleted event as success.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn create_event(&self, request: &CalendarEventRequest)
        -> Result<CalendarEvent, CalendarError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}

/// Result of provisioning a join link for a slot or booking.
///
/// Provisioning never fails the owning operation: when the provider errors,
/// the caller stores the fallback link and no external event id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioning {
    Ok(CalendarEvent),
    Degraded { fallback_url: String, reason: String },
}

impl Provisioning {
    pub fn meet_url(&self) -> &str {
        match self {
            Self::Ok(event) => &event.join_url,
            Self::Degraded { fallback_url, .. } => fallback_url,
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::Ok(event) => Some(&event.event_id),
            Self::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Create an event, downgrading any failure to [`Provisioning::Degraded`].
pub async fn provision(
    gateway: &dyn CalendarGateway,
    request: &CalendarEventRequest,
    fallback_url: &str,
) -> Provisioning {
    match gateway.create_event(request).await {
        Ok(event) => Provisioning::Ok(event),
        Err(e) => Provisioning::Degraded {
            fallback_url: fallback_url.to_string(),
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct Failing;

    #[async_trait]
    impl CalendarGateway for Failing {
        async fn create_event(
            &self,
            _request: &CalendarEventRequest,
        ) -> Result<CalendarEvent, CalendarError> {
            Err(CalendarError::HttpStatus(503))
        }

        async fn delete_event(&self, _event_id: &str) -> Result<(), CalendarError> {
            Ok(())
        }
    }

    struct Working;

    #[async_trait]
    impl CalendarGateway for Working {
        async fn create_event(
            &self,
            _request: &CalendarEventRequest,
        ) -> Result<CalendarEvent, CalendarError> {
            Ok(CalendarEvent {
                event_id: "evt-1".into(),
                join_url: "https://meet.example/abc".into(),
            })
        }

        async fn delete_event(&self, _event_id: &str) -> Result<(), CalendarError> {
            Ok(())
        }
    }

    fn request() -> CalendarEventRequest {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        CalendarEventRequest {
            summary: "Interview".into(),
            organizer: Participant {
                name: "Mentor".into(),
                email: "mentor@example.com".into(),
            },
            attendee: None,
            start_at: start,
            end_at: start + chrono::Duration::minutes(30),
            timezone: "UTC".into(),
        }
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback() {
        let result = provision(&Failing, &request(), "https://meet.example/fallback").await;
        assert!(result.is_degraded());
        assert_eq!(result.meet_url(), "https://meet.example/fallback");
        assert_eq!(result.event_id(), None);
        assert!(matches!(
            result,
            Provisioning::Degraded { ref reason, .. } if reason.contains("503")
        ));
    }

    #[tokio::test]
    async fn provider_success_carries_event() {
        let result = provision(&Working, &request(), "https://meet.example/fallback").await;
        assert_eq!(result.meet_url(), "https://meet.example/abc");
        assert_eq!(result.event_id(), Some("evt-1"));
    }

    #[test]
    fn gateway_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn CalendarGateway>();
    }
}
