use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::job::JobPosting;

/// Where a posting is in its trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Discovered,
    Analyzing,
    Composing,
    Dispatching,
    Succeeded,
    Failed,
}

impl ProcessingStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStage::Succeeded | ProcessingStage::Failed)
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingStage::Discovered => "discovered",
            ProcessingStage::Analyzing => "analyzing",
            ProcessingStage::Composing => "composing",
            ProcessingStage::Dispatching => "dispatching",
            ProcessingStage::Succeeded => "succeeded",
            ProcessingStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of handing one message to the mail transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReceipt {
    pub success: bool,
    pub error: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn delivered(to_email: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            to_email: to_email.into(),
            subject: subject.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        to_email: impl Into<String>,
        subject: impl Into<String>,
        error: impl ToString,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            to_email: to_email.into(),
            subject: subject.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What happened to one posting during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationOutcome {
    pub job_title: String,
    pub company: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub to_email: Option<String>,
    pub fit_score: Option<u8>,
    /// `Succeeded` or `Failed` once processed, `Discovered` if never reached.
    pub stage: ProcessingStage,
    /// Which stage broke, for failed outcomes.
    pub failed_at: Option<ProcessingStage>,
}

impl ApplicationOutcome {
    pub fn from_receipt(posting: &JobPosting, receipt: DeliveryReceipt, fit_score: Option<u8>) -> Self {
        if receipt.success {
            Self {
                job_title: posting.title.clone(),
                company: posting.company.clone(),
                success: true,
                error: None,
                timestamp: receipt.timestamp,
                to_email: Some(receipt.to_email),
                fit_score,
                stage: ProcessingStage::Succeeded,
                failed_at: None,
            }
        } else {
            let error = receipt
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Dispatch failed".to_string());
            Self::failed(posting, ProcessingStage::Dispatching, error, fit_score)
        }
    }

    pub fn failed(
        posting: &JobPosting,
        stage: ProcessingStage,
        error: impl ToString,
        fit_score: Option<u8>,
    ) -> Self {
        Self {
            job_title: posting.title.clone(),
            company: posting.company.clone(),
            success: false,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
            to_email: None,
            fit_score,
            stage: ProcessingStage::Failed,
            failed_at: Some(stage),
        }
    }

    /// A posting a cancelled batch never got to.
    pub fn pending(posting: &JobPosting) -> Self {
        Self {
            job_title: posting.title.clone(),
            company: posting.company.clone(),
            success: false,
            error: None,
            timestamp: Utc::now(),
            to_email: None,
            fit_score: None,
            stage: ProcessingStage::Discovered,
            failed_at: None,
        }
    }
}

/// Aggregate of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub message: String,
    pub discovered: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub outcomes: Vec<ApplicationOutcome>,
    /// Postings left in `Discovered` when the batch was cancelled.
    pub unprocessed: Vec<ApplicationOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn new(discovered: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            message: String::new(),
            discovered,
            processed: 0,
            succeeded: 0,
            failed: 0,
            cancelled: false,
            outcomes: Vec::new(),
            unprocessed: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    /// Count an outcome in; `processed` always equals `succeeded + failed`.
    /// Outcomes that never reached a terminal stage are kept aside uncounted.
    pub fn record(&mut self, outcome: ApplicationOutcome) {
        if !outcome.stage.is_terminal() {
            self.unprocessed.push(outcome);
            return;
        }
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.processed += 1;
        self.outcomes.push(outcome);
    }

    pub fn finish(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self.finished_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::sample_posting;

    #[test]
    fn report_counts_stay_consistent() {
        let posting = sample_posting("Engineer", "Acme");
        let mut report = PipelineReport::new(2, Utc::now());

        report.record(ApplicationOutcome::from_receipt(
            &posting,
            DeliveryReceipt::delivered("hiring@acme.com", "Hello"),
            Some(80),
        ));
        report.record(ApplicationOutcome::failed(
            &posting,
            ProcessingStage::Composing,
            "boom",
            None,
        ));

        report.record(ApplicationOutcome::pending(&posting));

        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded + report.failed, report.processed);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].stage, ProcessingStage::Succeeded);
        assert_eq!(report.outcomes[1].stage, ProcessingStage::Failed);
        assert_eq!(report.outcomes[1].failed_at, Some(ProcessingStage::Composing));
        assert_eq!(report.unprocessed.len(), 1);
        assert_eq!(report.unprocessed[0].stage, ProcessingStage::Discovered);
    }

    #[test]
    fn only_succeeded_and_failed_are_terminal() {
        let terminal: Vec<_> = [
            ProcessingStage::Discovered,
            ProcessingStage::Analyzing,
            ProcessingStage::Composing,
            ProcessingStage::Dispatching,
            ProcessingStage::Succeeded,
            ProcessingStage::Failed,
        ]
        .into_iter()
        .filter(ProcessingStage::is_terminal)
        .collect();
        assert_eq!(terminal, [ProcessingStage::Succeeded, ProcessingStage::Failed]);
    }

    #[test]
    fn failed_receipt_keeps_error_text() {
        let posting = sample_posting("Engineer", "Acme");
        let outcome = ApplicationOutcome::from_receipt(
            &posting,
            DeliveryReceipt::failed("x@acme.com", "Hi", "535 authentication failed"),
            None,
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("535 authentication failed"));
        assert_eq!(outcome.to_email, None);
        assert_eq!(outcome.stage, ProcessingStage::Failed);
        assert_eq!(outcome.failed_at, Some(ProcessingStage::Dispatching));
    }
}
