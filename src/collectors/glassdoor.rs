use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::collectors::session::BrowserSession;
use crate::collectors::{
    JobCollector, ListingSite, query_component, remote_hint, required, resolve_url,
    scrape_listings, select_attr, select_text, selector,
};
use crate::error::AppError;
use crate::models::job::{JobPosting, JobSource, SearchQuery};

const BASE_URL: &str = "https://www.glassdoor.com";

pub struct Glassdoor {
    card: Selector,
    link: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
}

impl Glassdoor {
    pub fn new() -> Self {
        Self {
            card: selector(".react-job-listing, li[data-test='jobListing']"),
            link: selector("[data-test='job-link'], [data-test='job-title']"),
            company: selector("[data-test='employer-name'], [data-test='emp-name']"),
            location: selector("[data-test='location'], [data-test='emp-location']"),
            salary: selector("[data-test='detailSalary']"),
        }
    }
}

impl Default for Glassdoor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobCollector for Glassdoor {
    fn source(&self) -> JobSource {
        JobSource::Glassdoor
    }

    async fn collect(
        &self,
        session: &dyn BrowserSession,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<JobPosting>, AppError> {
        scrape_listings(self, session, query, limit).await
    }
}

impl ListingSite for Glassdoor {
    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    // Location is not part of the URL; Glassdoor resolves it to an internal id
    // that only its own autocomplete knows.
    fn search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{BASE_URL}/Job/jobs.htm?sc.keyword={}&locT=N&locId=1&fromAge=-1&radius=100",
            query_component(&query.keyword_string(), "+")
        )
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn extract(&self, card: ElementRef<'_>) -> Result<JobPosting, AppError> {
        let title = required(select_text(&card, &self.link), "title")?;
        let company = required(select_text(&card, &self.company), "company")?;
        let job_url = select_attr(&card, &self.link, "href")
            .and_then(|href| resolve_url(self.base_url(), &href));
        let job_url = required(job_url, "job_url")?;

        let location = select_text(&card, &self.location).unwrap_or_default();
        let remote_option = remote_hint(&location);

        Ok(JobPosting {
            title,
            company,
            location,
            description: String::new(),
            requirements: Vec::new(),
            salary_range: select_text(&card, &self.salary),
            job_url,
            hiring_manager_email: None,
            application_deadline: None,
            job_type: None,
            remote_option,
        })
    }
}
