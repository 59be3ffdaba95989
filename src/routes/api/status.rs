use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::config::PublicConfig;
use crate::pipeline::StageStatus;
use crate::routes::AppState;

/// GET /api/config
pub async fn config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(state.config.as_ref().clone())
}

#[derive(Debug, Serialize)]
pub struct CrewStatus {
    pub stages: Vec<StageStatus>,
    pub running_batches: usize,
}

/// GET /api/crew/status
pub async fn crew(State(state): State<AppState>) -> Json<CrewStatus> {
    Json(CrewStatus {
        stages: state.pipeline.stage_status(),
        running_batches: state.batches.len(),
    })
}
