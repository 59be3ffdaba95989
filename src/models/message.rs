use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kinds of outreach the generator can write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    CoverLetter,
    FollowUp,
    Networking,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::CoverLetter => "cover_letter",
            MessageKind::FollowUp => "follow_up",
            MessageKind::Networking => "networking",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicant details framed around a cover letter when it is mailed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactCard {
    pub job_title: String,
    pub company: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub location: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// A composed message, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub subject: String,
    pub body: String,
    pub recipient_email: String,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    /// Display name for the From header.
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub contact: Option<ContactCard>,
}
