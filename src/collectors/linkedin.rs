use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::collectors::session::BrowserSession;
use crate::collectors::{
    JobCollector, ListingSite, query_component, remote_hint, required, resolve_url,
    scrape_listings, select_attr, select_text, selector,
};
use crate::error::AppError;
use crate::models::job::{JobPosting, JobSource, SearchQuery};

const BASE_URL: &str = "https://www.linkedin.com";

/// Public (logged-out) job search. Cards carry no description; the posting page
/// has to be fetched separately for that.
pub struct LinkedIn {
    card: Selector,
    title: Selector,
    link: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
}

impl LinkedIn {
    pub fn new() -> Self {
        Self {
            card: selector(".job-search-card"),
            title: selector(".job-search-card__title, .base-search-card__title"),
            link: selector("a.base-card__full-link, a.job-search-card__title, .job-search-card__title a"),
            company: selector(".job-search-card__subtitle, .base-search-card__subtitle"),
            location: selector(".job-search-card__location"),
            salary: selector(".job-search-card__salary-info"),
        }
    }
}

impl Default for LinkedIn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobCollector for LinkedIn {
    fn source(&self) -> JobSource {
        JobSource::LinkedIn
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

impl ListingSite for LinkedIn {
    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{BASE_URL}/jobs/search/?keywords={}&location={}",
            query_component(&query.keyword_string(), "%20"),
            query_component(query.location(), "%20")
        )
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn extract(&self, card: ElementRef<'_>) -> Result<JobPosting, AppError> {
        let title = required(select_text(&card, &self.title), "title")?;
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
