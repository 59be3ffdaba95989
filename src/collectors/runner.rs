use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;

use crate::collectors::session::{BrowserLauncher, BrowserSession};
use crate::collectors::{CollectorRegistry, JOB_DESCRIPTION, JOB_REQUIREMENTS};
use crate::config::PipelineSettings;
use crate::models::job::{JobDetails, JobPosting, JobSource, SearchQuery};

/// Turns a search query into postings. Never fails; an unreachable world is an
/// empty result.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self, query: &SearchQuery) -> Vec<JobPosting>;

    /// Whether a real scraper backs this stage.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Queries each requested site in turn through one browser session.
pub struct JobScraper {
    registry: CollectorRegistry,
    launcher: Arc<dyn BrowserLauncher>,
    settings: PipelineSettings,
}

impl JobScraper {
    pub fn new(
        registry: CollectorRegistry,
        launcher: Arc<dyn BrowserLauncher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            launcher,
            settings,
        }
    }

    /// Scrape up to `query.max_jobs()` postings across the query's sources.
    ///
    /// Each source is asked for an equal share (integer division, remainder
    /// dropped). A shortfall from one source is not handed to the next.
    pub async fn discover(&self, query: &SearchQuery) -> Vec<JobPosting> {
        let sources = query.sources();
        let share = query.max_jobs() / sources.len().max(1);
        if share == 0 {
            tracing::warn!(
                max_jobs = query.max_jobs(),
                sources = sources.len(),
                "max_jobs is smaller than the number of sources; nothing to fetch"
            );
            return Vec::new();
        }

        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to start browser session: {e}");
                return Vec::new();
            }
        };

        let session = OpenSession::new(session);
        let jobs = self.collect_all(session.get(), query, share).await;
        session.close().await;

        tracing::info!(
            found = jobs.len(),
            keywords = %query.keyword_string(),
            location = query.location(),
            "Discovery finished"
        );
        jobs
    }

    async fn collect_all(
        &self,
        session: &dyn BrowserSession,
        query: &SearchQuery,
        share: usize,
    ) -> Vec<JobPosting> {
        let max_jobs = query.max_jobs();
        let mut jobs = Vec::new();

        for (i, source) in query.sources().iter().enumerate() {
            if i > 0 && !self.settings.inter_source_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_source_delay).await;
            }

            jobs.extend(self.collect_from(*source, session, query, share).await);

            if jobs.len() >= max_jobs {
                break;
            }
        }

        jobs.truncate(max_jobs);
        jobs
    }

    async fn collect_from(
        &self,
        source: JobSource,
        session: &dyn BrowserSession,
        query: &SearchQuery,
        share: usize,
    ) -> Vec<JobPosting> {
        let Some(collector) = self.registry.get(source) else {
            tracing::warn!(%source, "Unsupported job site");
            return Vec::new();
        };

        let timeout = self.settings.source_timeout;
        match tokio::time::timeout(timeout, collector.collect(session, query, share)).await {
            Ok(Ok(jobs)) => {
                tracing::info!(%source, count = jobs.len(), "Collected postings");
                jobs
            }
            Ok(Err(e)) => {
                tracing::warn!(%source, "Error scraping source: {e}");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(%source, ?timeout, "Source timed out");
                Vec::new()
            }
        }
    }

    /// Fetch a posting's own page for its full description and requirement list.
    /// Returns empty details if the page cannot be loaded.
    pub async fn job_details(&self, job_url: &str) -> JobDetails {
        let session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to start browser session: {e}");
                return JobDetails::default();
            }
        };

        let session = OpenSession::new(session);
        let page = tokio::time::timeout(self.settings.source_timeout, session.get().navigate(job_url)).await;
        session.close().await;

        match page {
            Ok(Ok(html)) => parse_details(&html),
            Ok(Err(e)) => {
                tracing::warn!(%job_url, "Error getting job details: {e}");
                JobDetails::default()
            }
            Err(_) => {
                tracing::warn!(%job_url, "Timed out getting job details");
                JobDetails::default()
            }
        }
    }
}

/// A launched session that gets closed even if the caller's future is dropped
/// before reaching [`OpenSession::close`].
struct OpenSession {
    session: Arc<dyn BrowserSession>,
    closed: bool,
}

impl OpenSession {
    fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Arc::from(session),
            closed: false,
        }
    }

    fn get(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    async fn close(mut self) {
        self.session.close().await;
        self.closed = true;
    }
}

impl Drop for OpenSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let session = self.session.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("Browser session abandoned mid-use; closing in background");
                handle.spawn(async move { session.close().await });
            }
            Err(_) => tracing::warn!("Browser session dropped outside a runtime; left open"),
        }
    }
}

#[async_trait]
impl Discovery for JobScraper {
    async fn discover(&self, query: &SearchQuery) -> Vec<JobPosting> {
        JobScraper::discover(self, query).await
    }

    fn is_configured(&self) -> bool {
        !self.registry.is_empty()
    }
}

fn parse_details(html: &str) -> JobDetails {
    let document = Html::parse_document(html);

    let description = document
        .select(&JOB_DESCRIPTION)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty());

    let requirements = document
        .select(&JOB_REQUIREMENTS)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    JobDetails {
        description,
        requirements,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::collectors::JobCollector;
    use crate::error::AppError;
    use crate::models::job::sample_posting;

    struct FakeSession {
        closes: Arc<AtomicUsize>,
        page: String,
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn navigate(&self, _url: &str) -> Result<String, AppError> {
            Ok(self.page.clone())
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launches: AtomicUsize,
        closes: Arc<AtomicUsize>,
        fail: bool,
        page: String,
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, AppError> {
            if self.fail {
                return Err(AppError::Internal("no browser".into()));
            }
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                closes: self.closes.clone(),
                page: self.page.clone(),
            }))
        }
    }

    enum Behavior {
        Return(usize),
        Fail,
        Hang,
    }

    struct FakeCollector {
        source: JobSource,
        behavior: Behavior,
        calls: Mutex<Vec<usize>>,
    }

    impl FakeCollector {
        fn new(source: JobSource, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                source,
                behavior,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn limits(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobCollector for FakeCollector {
        fn source(&self) -> JobSource {
            self.source
        }

        async fn collect(
            &self,
            _session: &dyn BrowserSession,
            _query: &SearchQuery,
            limit: usize,
        ) -> Result<Vec<JobPosting>, AppError> {
            self.calls.lock().unwrap().push(limit);
            match self.behavior {
                Behavior::Return(n) => Ok((0..n)
                    .map(|i| sample_posting(&format!("{} job {i}", self.source), "Acme"))
                    .collect()),
                Behavior::Fail => Err(AppError::source_unavailable(self.source.as_str(), "blocked")),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    fn build_scraper(collectors: &[Arc<FakeCollector>], launcher: Arc<FakeLauncher>) -> JobScraper {
        let mut registry = CollectorRegistry::new();
        for collector in collectors {
            registry.register(collector.clone());
        }
        JobScraper::new(registry, launcher, PipelineSettings::immediate())
    }

    fn query(max_jobs: usize) -> SearchQuery {
        SearchQuery::new(vec!["rust".into()], "Remote").with_max_jobs(max_jobs)
    }

    #[tokio::test]
    async fn fills_max_jobs_when_sources_have_enough() {
        // ceil(10 / 3) = 4 per source
        let collectors = [
            FakeCollector::new(JobSource::Indeed, Behavior::Return(4)),
            FakeCollector::new(JobSource::LinkedIn, Behavior::Return(4)),
            FakeCollector::new(JobSource::Glassdoor, Behavior::Return(4)),
        ];
        let launcher = Arc::new(FakeLauncher::default());
        let jobs = build_scraper(&collectors, launcher).discover(&query(10)).await;

        assert_eq!(jobs.len(), 10);
        assert_eq!(collectors[0].limits(), vec![3]);
        assert!(jobs[0].title.starts_with("indeed"));
        assert!(jobs[9].title.starts_with("glassdoor"));
    }

    #[tokio::test]
    async fn stops_early_once_max_jobs_reached() {
        let collectors = [
            FakeCollector::new(JobSource::Indeed, Behavior::Return(5)),
            FakeCollector::new(JobSource::LinkedIn, Behavior::Return(5)),
            FakeCollector::new(JobSource::Glassdoor, Behavior::Return(5)),
        ];
        let launcher = Arc::new(FakeLauncher::default());
        let jobs = build_scraper(&collectors, launcher).discover(&query(9)).await;

        assert_eq!(jobs.len(), 9);
        assert!(collectors[2].limits().is_empty());
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let collectors = [
            FakeCollector::new(JobSource::Indeed, Behavior::Fail),
            FakeCollector::new(JobSource::LinkedIn, Behavior::Return(2)),
        ];
        let launcher = Arc::new(FakeLauncher::default());
        let query = query(4).with_sources([JobSource::Indeed, JobSource::LinkedIn]);
        let jobs = build_scraper(&collectors, launcher.clone()).discover(&query).await;

        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.title.starts_with("linkedin")));
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_source_times_out() {
        let collectors = [
            FakeCollector::new(JobSource::Indeed, Behavior::Hang),
            FakeCollector::new(JobSource::Glassdoor, Behavior::Return(1)),
        ];
        let launcher = Arc::new(FakeLauncher::default());
        let query = query(2).with_sources([JobSource::Indeed, JobSource::Glassdoor]);
        let jobs = build_scraper(&collectors, launcher.clone()).discover(&query).await;

        assert_eq!(jobs.len(), 1);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_discovery_still_closes_the_session() {
        let collectors = [FakeCollector::new(JobSource::Indeed, Behavior::Hang)];
        let launcher = Arc::new(FakeLauncher::default());
        let scraper = build_scraper(&collectors, launcher.clone());
        let query = query(1).with_sources([JobSource::Indeed]);

        let abandoned = tokio::time::timeout(Duration::from_secs(1), scraper.discover(&query)).await;
        assert!(abandoned.is_err());
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistered_source_yields_nothing() {
        let collectors = [FakeCollector::new(JobSource::Indeed, Behavior::Return(3))];
        let launcher = Arc::new(FakeLauncher::default());
        let query = query(6).with_sources([JobSource::LinkedIn, JobSource::Indeed]);
        let jobs = build_scraper(&collectors, launcher).discover(&query).await;

        assert_eq!(jobs.len(), 3);
    }

    #[tokio::test]
    async fn launch_failure_returns_empty() {
        let collectors = [FakeCollector::new(JobSource::Indeed, Behavior::Return(3))];
        let launcher = Arc::new(FakeLauncher {
            fail: true,
            ..Default::default()
        });
        let jobs = build_scraper(&collectors, launcher).discover(&query(3)).await;

        assert!(jobs.is_empty());
        assert!(collectors[0].limits().is_empty());
    }

    #[tokio::test]
    async fn share_of_zero_skips_the_browser() {
        let collectors = [FakeCollector::new(JobSource::Indeed, Behavior::Return(3))];
        let launcher = Arc::new(FakeLauncher::default());
        let jobs = build_scraper(&collectors, launcher.clone()).discover(&query(2)).await;

        assert!(jobs.is_empty());
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_sources_only() {
        let collectors = [
            FakeCollector::new(JobSource::Indeed, Behavior::Return(1)),
            FakeCollector::new(JobSource::LinkedIn, Behavior::Fail),
            FakeCollector::new(JobSource::Glassdoor, Behavior::Return(1)),
        ];
        let mut registry = CollectorRegistry::new();
        for collector in &collectors {
            registry.register(collector.clone());
        }
        let settings = PipelineSettings {
            inter_source_delay: Duration::from_secs(2),
            ..PipelineSettings::immediate()
        };
        let scraper = JobScraper::new(registry, Arc::new(FakeLauncher::default()), settings);

        let started = tokio::time::Instant::now();
        let jobs = scraper.discover(&query(30)).await;

        assert_eq!(jobs.len(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn job_details_reads_description_and_requirements() {
        let launcher = Arc::new(FakeLauncher {
            page: r#"<div class="job-description"><p>Design   APIs.</p></div>
                     <ul class="job-requirements"><li> Rust </li><li>SQL</li><li> </li></ul>"#
                .to_string(),
            ..Default::default()
        });
        let scraper = build_scraper(&[], launcher.clone());
        let details = scraper.job_details("https://jobs.example.com/1").await;

        assert_eq!(details.description.as_deref(), Some("Design APIs."));
        assert_eq!(details.requirements, vec!["Rust", "SQL"]);
        assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    }
}
