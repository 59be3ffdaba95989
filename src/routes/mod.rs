pub mod api;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::collectors::runner::JobScraper;
use crate::config::PublicConfig;
use crate::dispatch::MailDispatcher;
use crate::generator::ContentGenerator;
use crate::pipeline::ApplicationPipeline;
use crate::pipeline::batches::BatchRegistry;

/// Everything a handler may need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<JobScraper>,
    pub generator: Arc<ContentGenerator>,
    pub dispatcher: Arc<MailDispatcher>,
    pub pipeline: Arc<ApplicationPipeline>,
    pub batches: BatchRegistry,
    pub config: Arc<PublicConfig>,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(api::router(state))
}
