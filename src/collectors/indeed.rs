use async_trait::async_trait;
use scraper::{ElementRef, Selector};

use crate::collectors::session::BrowserSession;
use crate::collectors::{
    JobCollector, ListingSite, query_component, remote_hint, required, resolve_url,
    scrape_listings, select_attr, select_text, selector,
};
use crate::error::AppError;
use crate::models::job::{JobPosting, JobSource, SearchQuery};

const BASE_URL: &str = "https://www.indeed.com";

pub struct Indeed {
    card: Selector,
    title: Selector,
    link: Selector,
    company: Selector,
    location: Selector,
    snippet: Selector,
    salary: Selector,
}

impl Indeed {
    pub fn new() -> Self {
        Self {
            card: selector("[data-jk]"),
            title: selector("h2.jobTitle"),
            link: selector("h2.jobTitle a"),
            company: selector("[data-testid='company-name']"),
            location: selector("[data-testid='job-location'], [data-testid='text-location']"),
            snippet: selector(".job-snippet"),
            salary: selector(".salary-snippet-container, [data-testid='attribute_snippet_testid']"),
        }
    }
}

impl Default for Indeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobCollector for Indeed {
    fn source(&self) -> JobSource {
        JobSource::Indeed
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

impl ListingSite for Indeed {
    fn base_url(&self) -> &'static str {
        BASE_URL
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{BASE_URL}/jobs?q={}&l={}",
            query_component(&query.keyword_string(), "+"),
            query_component(query.location(), "+")
        )
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn extract(&self, card: ElementRef<'_>) -> Result<JobPosting, AppError> {
        let title = required(select_text(&card, &self.title), "title")?;
        let company = required(select_text(&card, &self.company), "company")?;

        // Prefer the card's own job key; the link href often carries tracking redirects.
        let job_url = card
            .value()
            .attr("data-jk")
            .map(|jk| format!("{BASE_URL}/viewjob?jk={jk}"))
            .or_else(|| {
                select_attr(&card, &self.link, "href")
                    .and_then(|href| resolve_url(self.base_url(), &href))
            });
        let job_url = required(job_url, "job_url")?;

        let location = select_text(&card, &self.location).unwrap_or_default();
        let remote_option = remote_hint(&location);

        Ok(JobPosting {
            title,
            company,
            location,
            description: select_text(&card, &self.snippet).unwrap_or_default(),
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
