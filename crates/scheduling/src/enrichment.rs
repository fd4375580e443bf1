//! Post-commit side effects for newly assigned interviews.
//!
//! Runs after the assignment transaction has committed, so nothing here can
//! undo an assignment. Each step is best effort and logged on failure.

use assessly_core::calendar::{provision, CalendarEventRequest, CalendarGateway, Provisioning};
use assessly_core::notify::{NotificationGateway, TemplateKind};
use assessly_db::models::interview_request::InterviewContext;
use assessly_db::repositories::TimeSpotRepo;
use assessly_db::DbPool;
use serde_json::json;

/// What enrichment managed to do for one interview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentResult {
    /// A calendar event was created and stored on the spot.
    pub calendar_event: bool,
    /// The candidate was notified.
    pub notified: bool,
}

/// Template data for interview messages. `window` is set for reminders.
pub fn template_data(
    ctx: &InterviewContext,
    meet_url: Option<&str>,
    window: Option<&str>,
) -> serde_json::Value {
    let mut data = json!({
        "interview_request_id": ctx.interview_request_id,
        "exam_id": ctx.exam_id,
        "candidate_name": ctx.candidate_name,
        "mentor_name": ctx.mentor_name,
        "start_at": ctx.start_at.to_rfc3339(),
        "end_at": ctx.end_at.to_rfc3339(),
        "timezone": ctx.timezone,
        "meet_url": meet_url.or(ctx.meet_url.as_deref()),
    });
    if let Some(window) = window {
        data["window"] = json!(window);
    }
    data
}

/// Create the mentor/candidate calendar event, store its link on the spot,
/// drop the spot's previous event and notify the candidate.
pub async fn enrich_interview(
    pool: &DbPool,
    calendar: &dyn CalendarGateway,
    notifier: &dyn NotificationGateway,
    fallback_meet_url: &str,
    ctx: &InterviewContext,
) -> EnrichmentResult {
    let mut result = EnrichmentResult::default();

    if !ctx.has_contacts() {
        tracing::warn!(
            interview_request_id = ctx.interview_request_id,
            "Interview is missing participant emails, skipping calendar and notification"
        );
        return result;
    }

    let request = CalendarEventRequest {
        summary: format!("Interview: {} with {}", ctx.candidate_name, ctx.mentor_name),
        organizer: ctx.mentor(),
        attendee: Some(ctx.candidate()),
        start_at: ctx.start_at,
        end_at: ctx.end_at,
        timezone: ctx.timezone.clone(),
    };
    let provisioning = provision(calendar, &request, fallback_meet_url).await;

    let meet_url = match &provisioning {
        Provisioning::Ok(event) => {
            let event_id = event.event_id.as_str();
            match TimeSpotRepo::set_meeting(pool, ctx.spot_id, &event.join_url, Some(event_id)).await
            {
                Ok(_) => {
                    result.calendar_event = true;
                    if let Some(old) = ctx.calendar_event_id.as_deref().filter(|old| *old != event_id) {
                        if let Err(e) = calendar.delete_event(old).await {
                            tracing::warn!(spot_id = ctx.spot_id, event_id = old, error = %e, "Failed to delete placeholder calendar event");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(spot_id = ctx.spot_id, error = %e, "Failed to store calendar event on spot");
                }
            }
            event.join_url.clone()
        }
        Provisioning::Degraded { reason, .. } => {
            tracing::warn!(
                interview_request_id = ctx.interview_request_id,
                reason = %reason,
                "Calendar event not created, keeping existing link"
            );
            match ctx.meet_url.clone() {
                Some(url) => url,
                None => {
                    if let Err(e) =
                        TimeSpotRepo::set_meeting(pool, ctx.spot_id, fallback_meet_url, None).await
                    {
                        tracing::warn!(spot_id = ctx.spot_id, error = %e, "Failed to store fallback link on spot");
                    }
                    fallback_meet_url.to_string()
                }
            }
        }
    };

    let data = template_data(ctx, Some(&meet_url), None);
    match notifier
        .send(&ctx.candidate(), TemplateKind::InterviewScheduled, &data)
        .await
    {
        Ok(()) => result.notified = true,
        Err(e) => tracing::warn!(
            interview_request_id = ctx.interview_request_id,
            error = %e,
            "Failed to send interview scheduled notification"
        ),
    }

    result
}
