use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Job listing sites the scraper knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Indeed,
    LinkedIn,
    Glassdoor,
}

impl JobSource {
    pub const ALL: [JobSource; 3] = [JobSource::Indeed, JobSource::LinkedIn, JobSource::Glassdoor];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Indeed => "indeed",
            JobSource::LinkedIn => "linkedin",
            JobSource::Glassdoor => "glassdoor",
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indeed" => Ok(JobSource::Indeed),
            "linkedin" => Ok(JobSource::LinkedIn),
            "glassdoor" => Ok(JobSource::Glassdoor),
            other => Err(AppError::BadRequest(format!("Unsupported job site: {other}"))),
        }
    }
}

pub const DEFAULT_MAX_JOBS: usize = 10;

/// What to search for and where. Built once per discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    keywords: Vec<String>,
    location: String,
    max_jobs: usize,
    sources: Vec<JobSource>,
}

impl SearchQuery {
    pub fn new(keywords: Vec<String>, location: impl Into<String>) -> Self {
        Self {
            keywords,
            location: location.into(),
            max_jobs: DEFAULT_MAX_JOBS,
            sources: JobSource::ALL.to_vec(),
        }
    }

    /// Cap on the total number of postings; zero is raised to one.
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs.max(1);
        self
    }

    /// Restrict to the given sources, keeping first-seen order and dropping repeats.
    /// An empty list keeps the default of every known source.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = JobSource>) -> Self {
        let mut unique = Vec::new();
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }
        if !unique.is_empty() {
            self.sources = unique;
        }
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    pub fn sources(&self) -> &[JobSource] {
        &self.sources
    }

    /// Keywords joined with single spaces, as typed into a site search box.
    pub fn keyword_string(&self) -> String {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub salary_range: Option<String>,
    pub job_url: String,
    pub hiring_manager_email: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub job_type: Option<String>,
    pub remote_option: Option<bool>,
}

impl JobPosting {
    /// Check the fields every posting must carry. Used on caller-supplied postings;
    /// collectors never build a posting that would fail this.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Job title is required".to_string()));
        }
        if self.company.trim().is_empty() {
            return Err(AppError::BadRequest("Company is required".to_string()));
        }
        if url::Url::parse(&self.job_url).is_err() {
            return Err(AppError::BadRequest(format!(
                "Invalid job URL: '{}'",
                self.job_url
            )));
        }
        Ok(())
    }

    /// The address outreach goes to: the listed contact, or a guessed
    /// `hiring@<company>.com` which may well not exist.
    pub fn recipient_email(&self) -> String {
        match &self.hiring_manager_email {
            Some(email) if !email.trim().is_empty() => email.trim().to_string(),
            _ => {
                let domain: String = self
                    .company
                    .to_lowercase()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                format!("hiring@{domain}.com")
            }
        }
    }
}

/// Long-form fields only available on a posting's own page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobDetails {
    pub description: Option<String>,
    pub requirements: Vec<String>,
}

#[cfg(test)]
pub(crate) fn sample_posting(title: &str, company: &str) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        company: company.to_string(),
        location: "Remote".to_string(),
        description: "Build and operate backend services.".to_string(),
        requirements: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        salary_range: None,
        job_url: format!(
            "https://jobs.example.com/{}",
            title.to_lowercase().replace(' ', "-")
        ),
        hiring_manager_email: None,
        application_deadline: None,
        job_type: None,
        remote_option: Some(true),
    }
}
