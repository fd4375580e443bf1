//! Plain-text message templates for each [`TemplateKind`].
//!
//! Template data is the JSON object built by the scheduling services. Known
//! keys: `candidate_name`, `mentor_name`, `start_at`, `end_at` (RFC 3339),
//! `timezone`, `meet_url` and, for reminders, `window`. Missing keys render
//! as neutral placeholders rather than failing the send.

use assessly_core::calendar::Participant;
use assessly_core::notify::TemplateKind;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Subject prefix for every outgoing message.
const SUBJECT_PREFIX: &str = "[Assessly]";

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Render `kind` for `recipient` using `data`.
pub fn render(
    kind: TemplateKind,
    recipient: &Participant,
    data: &serde_json::Value,
) -> RenderedMessage {
    let when = local_start(data);
    let link = field(data, "meet_url").unwrap_or("(link to follow)");
    let mentor = field(data, "mentor_name").unwrap_or("your mentor");

    match kind {
        TemplateKind::SlotReminder => {
            let window = field(data, "window").unwrap_or("upcoming");
            RenderedMessage {
                subject: format!("{SUBJECT_PREFIX} Reminder: interview at {when}"),
                body: format!(
                    "Hello {name},\n\n\
                     This is a reminder ({window}) that your interview with {mentor} \
                     starts at {when}.\n\n\
                     Join link: {link}\n",
                    name = recipient.name,
                ),
            }
        }
        TemplateKind::InterviewScheduled => RenderedMessage {
            subject: format!("{SUBJECT_PREFIX} Your interview is scheduled"),
            body: format!(
                "Hello {name},\n\n\
                 Your interview with {mentor} has been scheduled for {when}.\n\n\
                 Join link: {link}\n",
                name = recipient.name,
            ),
        },
    }
}

fn field<'a>(data: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Format `start_at` in the slot's timezone, e.g. `Mon, 01 Sep 2025 09:00 (Europe/Berlin)`.
fn local_start(data: &serde_json::Value) -> String {
    let Some(start) = field(data, "start_at")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
    else {
        return "the scheduled time".to_string();
    };

    match field(data, "timezone").and_then(|tz| tz.parse::<Tz>().ok()) {
        Some(tz) => format!(
            "{} ({})",
            start.with_timezone(&tz).format("%a, %d %b %Y %H:%M"),
            tz.name()
        ),
        None => format!("{} (UTC)", start.format("%a, %d %b %Y %H:%M")),
    }
}
