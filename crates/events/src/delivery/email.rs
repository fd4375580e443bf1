//! Email notification delivery via SMTP.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport and implements
//! [`NotificationGateway`]. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and [`LogOnlyNotifier`] should be used instead.

use assessly_core::calendar::Participant;
use assessly_core::notify::{NotificationError, NotificationGateway, TemplateKind};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::templates::render;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

impl From<EmailError> for NotificationError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::Address(e) => NotificationError::InvalidRecipient(e.to_string()),
            other => NotificationError::Delivery(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@assessly.local";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    /// Defaults to 587.
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | -                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@assessly.local`  |
    /// | `SMTP_USER`     | no       | -                         |
    /// | `SMTP_PASSWORD` | no       | -                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

/// Sends templated notification emails via SMTP.
pub struct SmtpNotifier {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Build the SMTP transport. No connection is opened until the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from = config.from_address.parse()?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            transport_builder = transport_builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from,
            mailer: transport_builder.build(),
        })
    }

}

/// Assemble the MIME message for `recipient`.
fn build_message(
    from: &Mailbox,
    recipient: &Participant,
    kind: TemplateKind,
    data: &serde_json::Value,
) -> Result<Message, EmailError> {
    let rendered = render(kind, recipient, data);
    let to = Mailbox::new(
        Some(recipient.name.clone()).filter(|n| !n.is_empty()),
        recipient.email.parse()?,
    );
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(rendered.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(rendered.body)
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl NotificationGateway for SmtpNotifier {
    async fn send(
        &self,
        recipient: &Participant,
        kind: TemplateKind,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        let message = build_message(&self.from, recipient, kind, data)?;
        self.mailer
            .send(message)
            .await
            .map_err(EmailError::from)?;

        tracing::info!(to = %recipient.email, template = kind.as_str(), "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogOnlyNotifier
// ---------------------------------------------------------------------------

/// Logs rendered messages instead of sending them. Used when SMTP is not
/// configured. Still rejects undeliverable addresses so failures stay
/// observable.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

#[async_trait]
impl NotificationGateway for LogOnlyNotifier {
    async fn send(
        &self,
        recipient: &Participant,
        kind: TemplateKind,
        data: &serde_json::Value,
    ) -> Result<(), NotificationError> {
        recipient
            .email
            .parse::<lettre::Address>()
            .map_err(|e| NotificationError::InvalidRecipient(e.to_string()))?;

        let rendered = render(kind, recipient, data);
        tracing::info!(
            to = %recipient.email,
            template = kind.as_str(),
            subject = %rendered.subject,
            "Notification (log only)"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
