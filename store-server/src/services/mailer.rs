//! Mail dispatch collaborator
//!
//! Delivery emails go out through the [`Mailer`] seam: SESv2 in production,
//! [`MemoryMailer`] in tests and when no sender identity is configured.

use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail dispatch failed: {0}")]
    Dispatch(String),
}

/// A fully rendered email ready for dispatch
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}

/// Production mailer over AWS SESv2
pub struct SesMailer {
    client: SesClient,
}

impl SesMailer {
    pub async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: SesClient::new(&config),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let subject = Content::builder()
            .data(&email.subject)
            .build()
            .map_err(|e| MailerError::Dispatch(e.to_string()))?;

        let html = Content::builder()
            .data(&email.html)
            .build()
            .map_err(|e| MailerError::Dispatch(e.to_string()))?;

        let body = Body::builder().html(html).build();
        let message = Message::builder().subject(subject).body(body).build();

        let from = format!("{} <{}>", email.from_name, email.from);
        self.client
            .send_email()
            .from_email_address(from)
            .destination(Destination::builder().to_addresses(&email.to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| MailerError::Dispatch(e.to_string()))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Delivery email sent");
        Ok(())
    }
}

/// Captures outgoing mail instead of dispatching it. Used by tests and as the
/// fallback when `MAIL_FROM` is not configured.
#[derive(Default)]
pub struct MemoryMailer {
    pub sent: std::sync::Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        tracing::warn!(to = %email.to, "MemoryMailer capturing email (no mail provider configured)");
        self.sent
            .lock()
            .map_err(|_| MailerError::Dispatch("mailer mutex poisoned".into()))?
            .push(email.clone());
        Ok(())
    }
}
