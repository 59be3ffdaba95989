pub mod applications;
pub mod email;
pub mod jobs;
pub mod status;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::routes::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Status
        .route("/config", get(status::config))
        .route("/crew/status", get(status::crew))
        // Jobs
        .route("/jobs/scrape", post(jobs::scrape))
        .route("/jobs/details", post(jobs::details))
        // Email
        .route("/email/generate", post(email::generate))
        .route("/email/send", post(email::send))
        .route("/email/analyze", post(email::analyze))
        // Applications
        .route("/application/process", post(applications::process))
        .route("/application/pipeline", post(applications::start_pipeline))
        .route("/application/pipeline/{id}", delete(applications::cancel_pipeline))
        .with_state(state);

    Router::new().nest("/api", api)
}
