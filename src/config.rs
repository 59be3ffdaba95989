use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use crate::error::AppError;
use crate::models::job::{JobSource, SearchQuery};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Parser, Debug, Clone)]
#[command(name = "jobreach", about = "Job discovery and outreach pipeline")]
pub struct Config {
    /// API key for the Groq chat-completions endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Model used for generation and fit analysis
    #[arg(long, env = "GROQ_MODEL", default_value = "llama3-8b-8192")]
    pub groq_model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "GROQ_BASE_URL", default_value = "https://api.groq.com/openai/v1")]
    pub groq_base_url: String,

    /// SMTP relay host
    #[arg(long, env = "SMTP_SERVER", default_value = "smtp.gmail.com")]
    pub smtp_server: String,

    /// SMTP port (STARTTLS)
    #[arg(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address for outgoing mail
    #[arg(long, env = "EMAIL_FROM")]
    pub email_from: Option<String>,

    /// Seconds to pause between listing sites
    #[arg(long, env = "SCRAPING_DELAY", default_value = "2.0")]
    pub scraping_delay: f64,

    /// Seconds to pause between postings in a batch (defaults to the scraping delay)
    #[arg(long, env = "JOB_DELAY")]
    pub job_delay: Option<f64>,

    /// Seconds before a listing site fetch is abandoned
    #[arg(long, env = "SOURCE_TIMEOUT", default_value = "30")]
    pub source_timeout: u64,

    /// Seconds before a generation request is abandoned
    #[arg(long, env = "LLM_TIMEOUT", default_value = "60")]
    pub llm_timeout: u64,

    /// Seconds before a mail delivery is abandoned
    #[arg(long, env = "DISPATCH_TIMEOUT", default_value = "30")]
    pub dispatch_timeout: u64,

    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log output format: "pretty" or "json"
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP API (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
        listen_addr: String,
    },
    /// Search listing sites and print the postings found
    Discover {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Discover postings and apply to each of them
    Run {
        #[command(flatten)]
        search: SearchArgs,

        /// Path to a JSON applicant profile
        #[arg(long)]
        profile: PathBuf,
    },
    /// Check SMTP connectivity and credentials
    Probe,
    /// Show the pipeline stages and whether each is configured
    Status,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search keywords
    #[arg(long, required = true, num_args = 1..)]
    pub keywords: Vec<String>,

    #[arg(long, default_value = "")]
    pub location: String,

    #[arg(long, default_value = "10")]
    pub max_jobs: usize,

    /// Sites to query (indeed, linkedin, glassdoor); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub sites: Vec<String>,
}

impl SearchArgs {
    pub fn to_query(&self) -> Result<SearchQuery, AppError> {
        let sources = self
            .sites
            .iter()
            .map(|s| s.parse::<JobSource>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SearchQuery::new(self.keywords.clone(), self.location.clone())
            .with_max_jobs(self.max_jobs)
            .with_sources(sources))
    }
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }

    /// Names of required settings that are unset. The affected collaborators run
    /// degraded instead of refusing to start.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let required = [
            ("GROQ_API_KEY", &self.groq_api_key),
            ("SMTP_USERNAME", &self.smtp_username),
            ("SMTP_PASSWORD", &self.smtp_password),
            ("EMAIL_FROM", &self.email_from),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        let scraping_delay = secs_f64(self.scraping_delay);
        PipelineSettings {
            inter_source_delay: scraping_delay,
            inter_job_delay: self.job_delay.map(secs_f64).unwrap_or(scraping_delay),
            source_timeout: Duration::from_secs(self.source_timeout),
            llm_timeout: Duration::from_secs(self.llm_timeout),
            dispatch_timeout: Duration::from_secs(self.dispatch_timeout),
        }
    }

    /// Settings safe to show to callers; no secrets.
    pub fn public_view(&self) -> PublicConfig {
        PublicConfig {
            groq_model: self.groq_model.clone(),
            scraping_delay: self.scraping_delay,
            job_delay: self.job_delay.unwrap_or(self.scraping_delay),
            smtp_server: self.smtp_server.clone(),
            smtp_port: self.smtp_port,
            missing_settings: self.missing_settings(),
        }
    }
}

fn secs_f64(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

/// Pacing and timeout knobs for the core pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub inter_source_delay: Duration,
    pub inter_job_delay: Duration,
    pub source_timeout: Duration,
    pub llm_timeout: Duration,
    pub dispatch_timeout: Duration,
}

impl PipelineSettings {
    /// No pauses, short timeouts. Meant for tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            inter_source_delay: Duration::ZERO,
            inter_job_delay: Duration::ZERO,
            source_timeout: Duration::from_secs(5),
            llm_timeout: Duration::from_secs(5),
            dispatch_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            inter_source_delay: Duration::from_secs(2),
            inter_job_delay: Duration::from_secs(2),
            source_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(60),
            dispatch_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicConfig {
    pub groq_model: String,
    pub scraping_delay: f64,
    pub job_delay: f64,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub missing_settings: Vec<&'static str>,
}
