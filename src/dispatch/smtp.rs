use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::dispatch::{MailTransport, OutboundMail};
use crate::error::AppError;

/// SMTP with STARTTLS and username/password auth.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Dispatch(format!("Invalid SMTP relay '{host}': {e}")))?
            .port(port)
            .credentials(Credentials::new(username.into(), password.into()))
            .timeout(Some(timeout))
            .build();

        tracing::info!(host, port, "SMTP transport initialized");
        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, mail: &OutboundMail) -> Result<(), AppError> {
        let message = build_message(mail)?;
        tracing::debug!(to = %mail.to, subject = %mail.subject, "Sending email via SMTP");

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Dispatch(e.to_string()))?;
        Ok(())
    }

    async fn test_connection(&self) -> Result<bool, AppError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| AppError::Dispatch(e.to_string()))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, AppError> {
    address
        .parse()
        .map_err(|e| AppError::Dispatch(format!("Invalid address '{address}': {e}")))
}

pub(crate) fn build_message(mail: &OutboundMail) -> Result<Message, AppError> {
    let mut body = MultiPart::mixed().singlepart(SinglePart::html(mail.html_body.clone()));

    for attachment in &mail.attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .unwrap_or(ContentType::TEXT_PLAIN);
        body = body.singlepart(
            Attachment::new(attachment.filename.clone()).body(attachment.data.clone(), content_type),
        );
    }

    let mut from = mailbox(&mail.from)?;
    if let Some(name) = mail.from_name.as_deref().filter(|n| !n.trim().is_empty()) {
        from = Mailbox::new(Some(name.trim().to_string()), from.email);
    }

    Message::builder()
        .from(from)
        .to(mailbox(&mail.to)?)
        .subject(mail.subject.as_str())
        .multipart(body)
        .map_err(|e| AppError::Dispatch(e.to_string()))
}
