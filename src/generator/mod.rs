//! Message composition and fit analysis on top of a [`TextCompletion`] backend.
//!
//! Nothing here fails outward: every generation problem degrades to a static
//! fallback so a batch can keep going.

pub mod templates;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::llm::TextCompletion;
use crate::models::fit::{Confidence, FitAnalysis};
use crate::models::job::JobPosting;
use crate::models::message::{ContactCard, GeneratedMessage, MessageKind};
use crate::models::profile::ApplicantProfile;

const BODY_TEMPERATURE: f32 = 0.7;
const BODY_MAX_TOKENS: u32 = 1000;
const SUBJECT_TEMPERATURE: f32 = 0.5;
const SUBJECT_MAX_TOKENS: u32 = 50;
const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 500;

/// Stage that rates a posting against a profile.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_fit(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
    ) -> Result<FitAnalysis, AppError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Stage that writes the outreach message for a posting.
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
        kind: MessageKind,
        template_override: Option<&str>,
    ) -> Result<GeneratedMessage, AppError>;

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct ContentGenerator {
    client: Arc<dyn TextCompletion>,
    llm_timeout: Duration,
}

impl ContentGenerator {
    pub fn new(client: Arc<dyn TextCompletion>, llm_timeout: Duration) -> Self {
        Self {
            client,
            llm_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Subject and body are generated independently; each falls back on its own.
    pub async fn compose(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
        kind: MessageKind,
        template_override: Option<&str>,
    ) -> GeneratedMessage {
        let body = self.body(posting, profile, kind, template_override).await;
        let subject = self.subject(posting, kind).await;

        let contact = match kind {
            MessageKind::CoverLetter => Some(contact_card(posting, profile)),
            _ => None,
        };

        GeneratedMessage {
            subject,
            body,
            recipient_email: posting.recipient_email(),
            attachments: Vec::new(),
            sender_name: non_blank(&profile.name),
            contact,
        }
    }

    pub async fn analyze_fit(&self, posting: &JobPosting, profile: &ApplicantProfile) -> FitAnalysis {
        let prompt = templates::analysis_prompt(posting, profile);
        let reply = self
            .ask(
                templates::ANALYST_INSTRUCTION,
                &prompt,
                ANALYSIS_TEMPERATURE,
                ANALYSIS_MAX_TOKENS,
            )
            .await;

        match reply {
            Ok(text) => parse_fit(&text).unwrap_or_else(|| {
                tracing::debug!(company = %posting.company, "Fit reply was not usable JSON");
                FitAnalysis::unparsed_estimate(&profile.skills)
            }),
            Err(e) => {
                tracing::warn!(company = %posting.company, error = %e, "Fit analysis failed");
                FitAnalysis::unavailable()
            }
        }
    }

    async fn body(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
        kind: MessageKind,
        template_override: Option<&str>,
    ) -> String {
        let template = template_override
            .or(match kind {
                MessageKind::CoverLetter => profile.cover_letter_template.as_deref(),
                _ => None,
            })
            .unwrap_or_else(|| templates::prompt_template(kind));

        let result = match templates::render_prompt(template, posting, profile) {
            Ok(prompt) => {
                self.ask(
                    templates::system_instruction(kind),
                    &prompt,
                    BODY_TEMPERATURE,
                    BODY_MAX_TOKENS,
                )
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    company = %posting.company,
                    error = %e,
                    "Body generation failed, using fallback"
                );
                templates::fallback_body(kind).to_string()
            }
        }
    }

    async fn subject(&self, posting: &JobPosting, kind: MessageKind) -> String {
        let prompt = templates::subject_prompt(posting, kind);
        let result = self
            .ask(
                templates::SUBJECT_INSTRUCTION,
                &prompt,
                SUBJECT_TEMPERATURE,
                SUBJECT_MAX_TOKENS,
            )
            .await;

        match result.map(|raw| clean_subject(&raw)) {
            Ok(Some(subject)) => subject,
            Ok(None) => templates::fallback_subject(posting),
            Err(e) => {
                tracing::warn!(company = %posting.company, error = %e, "Subject generation failed, using fallback");
                templates::fallback_subject(posting)
            }
        }
    }

    /// One completion call under the configured timeout. Blank replies count as failures.
    async fn ask(
        &self,
        system_instruction: &str,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, AppError> {
        let call = self
            .client
            .complete(system_instruction, prompt, temperature, max_output_tokens);
        let text = with_timeout("completion", self.llm_timeout, call).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Generation("Empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}

async fn with_timeout<T>(
    what: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::Timeout(what, limit))?
}

#[async_trait]
impl Analyzer for ContentGenerator {
    async fn analyze_fit(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
    ) -> Result<FitAnalysis, AppError> {
        Ok(ContentGenerator::analyze_fit(self, posting, profile).await)
    }

    fn is_configured(&self) -> bool {
        ContentGenerator::is_configured(self)
    }
}

#[async_trait]
impl Composer for ContentGenerator {
    async fn compose(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
        kind: MessageKind,
        template_override: Option<&str>,
    ) -> Result<GeneratedMessage, AppError> {
        Ok(ContentGenerator::compose(self, posting, profile, kind, template_override).await)
    }

    fn is_configured(&self) -> bool {
        ContentGenerator::is_configured(self)
    }
}

/// First non-blank line, minus a `Subject:` label and wrapping quotes.
fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn contact_card(posting: &JobPosting, profile: &ApplicantProfile) -> ContactCard {
    ContactCard {
        job_title: posting.title.clone(),
        company: posting.company.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        phone: profile.phone.as_deref().and_then(non_blank),
        location: profile.location.clone(),
        linkedin_url: profile.linkedin_url.as_deref().and_then(non_blank),
    }
}

fn clean_subject(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = match line.get(..8) {
        Some(prefix) if prefix.eq_ignore_ascii_case("subject:") => line[8..].trim(),
        _ => line,
    };
    let line = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '*' | '`'))
        .trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// Lenient view of the analyst's JSON: score may be a float and field names vary.
#[derive(Debug, Deserialize)]
struct RawFit {
    #[serde(alias = "score")]
    fit_score: f64,
    #[serde(default)]
    matching_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default, alias = "confidence")]
    confidence_level: Option<String>,
}

fn parse_fit(text: &str) -> Option<FitAnalysis> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let raw: RawFit = serde_json::from_str(&text[start..=end]).ok()?;
    if !raw.fit_score.is_finite() {
        return None;
    }

    let confidence = match raw
        .confidence_level
        .as_deref()
        .map(|c| c.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("high") => Confidence::High,
        Some("low") => Confidence::Low,
        _ => Confidence::Medium,
    };

    Some(FitAnalysis {
        score: raw.fit_score.round().clamp(0.0, 100.0) as u8,
        matching_skills: raw.matching_skills,
        missing_skills: raw.missing_skills,
        recommendations: raw.recommendations,
        confidence,
    })
}
