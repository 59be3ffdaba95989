//! End-to-end application flow: discover, then analyze, compose and dispatch
//! each posting in turn.

pub mod batches;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::collectors::runner::Discovery;
use crate::config::PipelineSettings;
use crate::dispatch::Dispatcher;
use crate::generator::{Analyzer, Composer};
use crate::models::job::{JobPosting, SearchQuery};
use crate::models::message::MessageKind;
use crate::models::outcome::{ApplicationOutcome, PipelineReport, ProcessingStage};
use crate::models::profile::ApplicantProfile;

pub const NO_JOBS_MESSAGE: &str = "No jobs found matching the criteria";
pub const COMPLETED_MESSAGE: &str = "Job application pipeline completed";
pub const CANCELLED_MESSAGE: &str = "Job application pipeline cancelled";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStatus {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub configured: bool,
}

pub struct ApplicationPipeline {
    discovery: Arc<dyn Discovery>,
    analyzer: Arc<dyn Analyzer>,
    composer: Arc<dyn Composer>,
    dispatcher: Arc<dyn Dispatcher>,
    settings: PipelineSettings,
}

impl ApplicationPipeline {
    pub fn new(
        discovery: Arc<dyn Discovery>,
        analyzer: Arc<dyn Analyzer>,
        composer: Arc<dyn Composer>,
        dispatcher: Arc<dyn Dispatcher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            discovery,
            analyzer,
            composer,
            dispatcher,
            settings,
        }
    }

    /// Analyze, compose and send for one posting. Errors end up in the outcome.
    pub async fn process_one(
        &self,
        posting: &JobPosting,
        profile: &ApplicantProfile,
    ) -> ApplicationOutcome {
        tracing::info!(title = %posting.title, company = %posting.company, "Processing application");

        let fit = match self.analyzer.analyze_fit(posting, profile).await {
            Ok(fit) => fit,
            Err(e) => return self.fail(posting, ProcessingStage::Analyzing, e, None),
        };
        let fit_score = Some(fit.score);
        tracing::debug!(company = %posting.company, score = fit.score, "Fit analyzed");

        let message = match self
            .composer
            .compose(posting, profile, MessageKind::CoverLetter, None)
            .await
        {
            Ok(message) => message,
            Err(e) => return self.fail(posting, ProcessingStage::Composing, e, fit_score),
        };

        match self.dispatcher.send(&message).await {
            Ok(receipt) => {
                let outcome = ApplicationOutcome::from_receipt(posting, receipt, fit_score);
                if !outcome.success {
                    tracing::warn!(
                        company = %posting.company,
                        error = outcome.error.as_deref().unwrap_or_default(),
                        "Application not delivered"
                    );
                }
                outcome
            }
            Err(e) => self.fail(posting, ProcessingStage::Dispatching, e, fit_score),
        }
    }

    fn fail(
        &self,
        posting: &JobPosting,
        stage: ProcessingStage,
        error: impl std::fmt::Display,
        fit_score: Option<u8>,
    ) -> ApplicationOutcome {
        tracing::warn!(company = %posting.company, failed_at = %stage, error = %error, "Application failed");
        ApplicationOutcome::failed(posting, stage, error, fit_score)
    }

    /// Discover once, then process every posting in order with a pause between
    /// them. Cancellation stops before the next posting and returns what was done.
    pub async fn run_batch(
        &self,
        query: &SearchQuery,
        profile: &ApplicantProfile,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let started_at = Utc::now();
        tracing::info!(keywords = %query.keyword_string(), location = query.location(), "Starting pipeline");

        let postings = self.discovery.discover(query).await;
        let mut report = PipelineReport::new(postings.len(), started_at);
        if postings.is_empty() {
            return report.finish(NO_JOBS_MESSAGE);
        }

        for (i, posting) in postings.iter().enumerate() {
            if i > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.settings.inter_job_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                tracing::info!(processed = report.processed, "Pipeline cancelled");
                for skipped in &postings[i..] {
                    report.record(ApplicationOutcome::pending(skipped));
                }
                report.cancelled = true;
                return report.finish(CANCELLED_MESSAGE);
            }

            let outcome = self.process_one(posting, profile).await;
            report.record(outcome);
        }

        tracing::info!(
            discovered = report.discovered,
            succeeded = report.succeeded,
            failed = report.failed,
            "Pipeline finished"
        );
        report.finish(COMPLETED_MESSAGE)
    }

    pub fn stage_status(&self) -> Vec<StageStatus> {
        vec![
            StageStatus {
                name: "research",
                role: "Job Research Specialist",
                goal: "Analyze job postings and extract key information for applications",
                configured: self.discovery.is_configured() && self.analyzer.is_configured(),
            },
            StageStatus {
                name: "strategy",
                role: "Email Strategy Specialist",
                goal: "Develop personalized email strategies for job applications",
                configured: self.composer.is_configured(),
            },
            StageStatus {
                name: "coordinator",
                role: "Application Coordinator",
                goal: "Coordinate and execute job applications with personalized emails",
                configured: self.dispatcher.is_configured(),
            },
        ]
    }
}
