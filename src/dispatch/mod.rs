//! Outbound mail. [`MailDispatcher`] turns a composed message into an HTML
//! email and hands it to a [`MailTransport`].

pub mod smtp;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::message::{ContactCard, GeneratedMessage};
use crate::models::outcome::DeliveryReceipt;

#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully assembled email, independent of the wire transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMail {
    pub from: String,
    pub from_name: Option<String>,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<MailAttachment>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutboundMail) -> Result<(), AppError>;

    async fn test_connection(&self) -> Result<bool, AppError>;
}

/// Stage that delivers composed messages.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, message: &GeneratedMessage) -> Result<DeliveryReceipt, AppError>;

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct MailDispatcher {
    transport: Option<Arc<dyn MailTransport>>,
    from: Option<String>,
    timeout: Duration,
}

impl MailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, from: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport: Some(transport),
            from: Some(from.into()),
            timeout,
        }
    }

    /// A dispatcher with no transport. Every send fails without touching the network.
    pub fn unconfigured(timeout: Duration) -> Self {
        Self {
            transport: None,
            from: None,
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some() && self.from.is_some()
    }

    /// Never errors: problems are reported in the receipt.
    pub async fn send(&self, message: &GeneratedMessage) -> DeliveryReceipt {
        match self.deliver(message).await {
            Ok(()) => {
                tracing::info!(
                    to = %message.recipient_email,
                    subject = %message.subject,
                    "Email sent"
                );
                DeliveryReceipt::delivered(&message.recipient_email, &message.subject)
            }
            Err(e) => {
                tracing::warn!(to = %message.recipient_email, error = %e, "Email not sent");
                DeliveryReceipt::failed(&message.recipient_email, &message.subject, e)
            }
        }
    }

    /// Check the transport is reachable and accepts our credentials.
    pub async fn probe(&self) -> bool {
        let Some(transport) = &self.transport else {
            tracing::warn!("No mail transport configured");
            return false;
        };

        match tokio::time::timeout(self.timeout, transport.test_connection()).await {
            Ok(Ok(ok)) => ok,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Mail transport probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Mail transport probe timed out");
                false
            }
        }
    }

    async fn deliver(&self, message: &GeneratedMessage) -> Result<(), AppError> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            return Err(AppError::ConfigurationMissing(
                "SMTP credentials or sender address".to_string(),
            ));
        };

        let mail = OutboundMail {
            from: from.clone(),
            from_name: message.sender_name.clone(),
            to: message.recipient_email.clone(),
            subject: message.subject.clone(),
            html_body: match &message.contact {
                Some(contact) => application_html(&message.body, contact),
                None => text_to_html(&message.body),
            },
            attachments: load_attachments(&message.attachments).await,
        };

        tokio::time::timeout(self.timeout, transport.deliver(&mail))
            .await
            .map_err(|_| AppError::Timeout("mail delivery", self.timeout))?
    }
}

#[async_trait]
impl Dispatcher for MailDispatcher {
    async fn send(&self, message: &GeneratedMessage) -> Result<DeliveryReceipt, AppError> {
        Ok(MailDispatcher::send(self, message).await)
    }

    fn is_configured(&self) -> bool {
        MailDispatcher::is_configured(self)
    }
}

async fn load_attachments(paths: &[PathBuf]) -> Vec<MailAttachment> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(data) => attachments.push(MailAttachment {
                filename: file_name(path),
                content_type: mime_guess::from_path(path)
                    .first_or_octet_stream()
                    .to_string(),
                data,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping attachment");
            }
        }
    }
    attachments
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

/// Escape plain text and wrap it in paragraphs. Blank lines separate paragraphs;
/// single newlines become `<br>`.
pub fn text_to_html(text: &str) -> String {
    format!("<html><body>\n{}\n</body></html>", paragraphs(text))
}

/// Cover letter layout: position header, the letter, then the applicant's contact block.
pub fn application_html(text: &str, contact: &ContactCard) -> String {
    let mut html = String::from("<html><body>\n");
    html.push_str(&format!(
        "<p><strong>Position:</strong> {}<br>\n<strong>Company:</strong> {}<br>\n<strong>Applicant:</strong> {}</p>\n<hr>\n",
        escape_html(&contact.job_title),
        escape_html(&contact.company),
        escape_html(&contact.name),
    ));
    html.push_str(&paragraphs(text));
    html.push_str("\n<hr>\n<h3>Contact Information</h3>\n");
    html.push_str(&format!(
        "<p>Email: {}<br>\nPhone: {}<br>\nLocation: {}",
        escape_html(&contact.email),
        escape_html(contact.phone.as_deref().unwrap_or("N/A")),
        escape_html(&contact.location),
    ));
    if let Some(url) = &contact.linkedin_url {
        let url = escape_html(url);
        html.push_str(&format!("<br>\nLinkedIn: <a href=\"{url}\">{url}</a>"));
    }
    html.push_str("</p>\n</body></html>");
    html
}

fn paragraphs(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim_end())).collect();
            format!("<p>{}</p>", lines.join("<br>\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundMail>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &OutboundMail) -> Result<(), AppError> {
            if let Some(reason) = &self.fail_with {
                return Err(AppError::Dispatch(reason.clone()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }

        async fn test_connection(&self) -> Result<bool, AppError> {
            match &self.fail_with {
                Some(reason) => Err(AppError::Dispatch(reason.clone())),
                None => Ok(true),
            }
        }
    }

    struct StalledTransport;

    #[async_trait]
    impl MailTransport for StalledTransport {
        async fn deliver(&self, _: &OutboundMail) -> Result<(), AppError> {
            std::future::pending().await
        }

        async fn test_connection(&self) -> Result<bool, AppError> {
            std::future::pending().await
        }
    }

    fn message(attachments: Vec<PathBuf>) -> GeneratedMessage {
        GeneratedMessage {
            subject: "Application for SRE Position".into(),
            body: "Dear team,\n\nI'd like <b>this</b> role.\nThanks".into(),
            recipient_email: "hiring@hooli.com".into(),
            attachments,
            sender_name: None,
            contact: None,
        }
    }

    fn dispatcher(transport: Arc<dyn MailTransport>) -> MailDispatcher {
        MailDispatcher::new(transport, "ada@example.com", Duration::from_secs(30))
    }

    #[tokio::test]
    async fn delivers_html_body() {
        let transport = Arc::new(RecordingTransport::default());
        let receipt = dispatcher(transport.clone()).send(&message(vec![])).await;

        assert!(receipt.success);
        assert_eq!(receipt.to_email, "hiring@hooli.com");
        assert_eq!(receipt.subject, "Application for SRE Position");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "ada@example.com");
        assert_eq!(sent[0].from_name, None);
        assert!(sent[0].html_body.contains("<p>Dear team,</p>"));
        assert!(!sent[0].html_body.contains("Contact Information"));
        assert!(sent[0].html_body.contains("I&#39;d like &lt;b&gt;this&lt;/b&gt; role.<br>\nThanks"));
    }

    #[tokio::test]
    async fn cover_letter_is_framed_with_contact_block() {
        let transport = Arc::new(RecordingTransport::default());
        let mut letter = message(vec![]);
        letter.sender_name = Some("Ada Lovelace".into());
        letter.contact = Some(ContactCard {
            job_title: "SRE".into(),
            company: "Hooli & Co".into(),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            location: "London".into(),
            linkedin_url: Some("https://linkedin.com/in/ada".into()),
        });

        let receipt = dispatcher(transport.clone()).send(&letter).await;
        assert!(receipt.success);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].from, "ada@example.com");
        assert_eq!(sent[0].from_name.as_deref(), Some("Ada Lovelace"));

        let html = &sent[0].html_body;
        assert!(html.contains("<strong>Company:</strong> Hooli &amp; Co"));
        assert!(html.contains("<strong>Applicant:</strong> Ada Lovelace"));
        assert!(html.contains("<p>Dear team,</p>"));
        assert!(html.contains("<h3>Contact Information</h3>"));
        assert!(html.contains("Phone: N/A"));
        assert!(html.contains("Location: London"));
        assert!(html.contains(r#"<a href="https://linkedin.com/in/ada">"#));
        assert!(html.find("Position:").unwrap() < html.find("Dear team").unwrap());
        assert!(html.find("Dear team").unwrap() < html.find("Contact Information").unwrap());
    }

    #[tokio::test]
    async fn missing_attachment_is_skipped() {
        let dir = std::env::temp_dir().join(format!("jobreach-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let resume = dir.join("resume.pdf");
        tokio::fs::write(&resume, b"%PDF-1.4").await.unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let receipt = dispatcher(transport.clone())
            .send(&message(vec![resume, dir.join("missing.docx")]))
            .await;
        assert!(receipt.success);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].attachments[0].filename, "resume.pdf");
        assert_eq!(sent[0].attachments[0].content_type, "application/pdf");
        assert_eq!(sent[0].attachments[0].data, b"%PDF-1.4");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn transport_error_becomes_failed_receipt() {
        let transport = Arc::new(RecordingTransport {
            fail_with: Some("550 mailbox unavailable".into()),
            ..Default::default()
        });
        let d = dispatcher(transport);
        let receipt = d.send(&message(vec![])).await;

        assert!(!receipt.success);
        assert!(receipt.error.unwrap().contains("550 mailbox unavailable"));
        assert!(!d.probe().await);
    }

    #[tokio::test]
    async fn unconfigured_dispatcher_fails_fast() {
        let d = MailDispatcher::unconfigured(Duration::from_secs(30));
        assert!(!d.is_configured());

        let receipt = d.send(&message(vec![])).await;
        assert!(!receipt.success);
        assert!(receipt.error.unwrap().starts_with("Configuration missing"));
        assert!(!d.probe().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_transport_times_out() {
        let d = MailDispatcher::new(Arc::new(StalledTransport), "a@b.c", Duration::from_secs(3));
        let receipt = d.send(&message(vec![])).await;

        assert!(!receipt.success);
        assert!(receipt.error.unwrap().contains("timed out"));
        assert!(!d.probe().await);
    }

    #[test]
    fn html_conversion_drops_blank_paragraphs() {
        let html = text_to_html("one\r\n\r\n\r\n\r\ntwo & three");
        assert_eq!(html, "<html><body>\n<p>one</p>\n<p>two &amp; three</p>\n</body></html>");
    }
}
