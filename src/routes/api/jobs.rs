use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::job::{DEFAULT_MAX_JOBS, JobDetails, JobPosting, JobSource, SearchQuery};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: String,
    pub max_jobs: Option<usize>,
    #[serde(default)]
    pub sites: Vec<String>,
}

impl SearchRequest {
    /// Validate and turn into a query. Unknown sites are rejected.
    pub fn to_query(&self) -> Result<SearchQuery, AppError> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::BadRequest("At least one keyword is required".to_string()));
        }
        let sources = self
            .sites
            .iter()
            .map(|s| s.parse::<JobSource>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchQuery::new(self.keywords.clone(), self.location.clone())
            .with_max_jobs(self.max_jobs.unwrap_or(DEFAULT_MAX_JOBS))
            .with_sources(sources))
    }
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub jobs_found: usize,
    pub jobs: Vec<JobPosting>,
}

/// POST /api/jobs/scrape
pub async fn scrape(
    State(state): State<AppState>,
    Json(input): Json<SearchRequest>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let query = input.to_query()?;
    tracing::info!(keywords = %query.keyword_string(), "Scraping jobs");

    let jobs = state.scraper.discover(&query).await;
    Ok(Json(ScrapeResponse {
        success: true,
        jobs_found: jobs.len(),
        jobs,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    pub job_url: String,
}

/// POST /api/jobs/details
pub async fn details(
    State(state): State<AppState>,
    Json(input): Json<DetailsRequest>,
) -> Result<Json<JobDetails>, AppError> {
    let url = url::Url::parse(&input.job_url)
        .map_err(|_| AppError::BadRequest(format!("Invalid job URL: '{}'", input.job_url)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::BadRequest(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    Ok(Json(state.scraper.job_details(url.as_str()).await))
}
