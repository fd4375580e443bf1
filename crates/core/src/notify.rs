//! Notification delivery capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::calendar::Participant;

/// Message templates the scheduling core sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// "Your interview starts soon" for a reminder window.
    SlotReminder,
    /// Confirmation that an interview has been scheduled.
    InterviewScheduled,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlotReminder => "slot_reminder",
            Self::InterviewScheduled => "interview_scheduled",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The recipient address is not deliverable.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The transport refused or failed to deliver the message.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivers templated messages. Failures surface to the caller, which
/// decides whether they are fatal.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(
        &self,
        recipient: &Participant,
        kind: TemplateKind,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError>;
}
