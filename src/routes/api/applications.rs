use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::job::JobPosting;
use crate::models::outcome::ApplicationOutcome;
use crate::models::profile::ApplicantProfile;
use crate::routes::AppState;
use crate::routes::api::jobs::SearchRequest;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub job_posting: JobPosting,
    pub user_profile: ApplicantProfile,
}

/// POST /api/application/process
pub async fn process(
    State(state): State<AppState>,
    Json(input): Json<ProcessRequest>,
) -> Result<Json<ApplicationOutcome>, AppError> {
    input.job_posting.validate()?;
    let outcome = state
        .pipeline
        .process_one(&input.job_posting, &input.user_profile)
        .await;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    #[serde(flatten)]
    pub search: SearchRequest,
    pub user_profile: ApplicantProfile,
}

#[derive(Debug, Serialize)]
pub struct PipelineStarted {
    pub success: bool,
    pub message: &'static str,
    pub request_id: Uuid,
}

/// POST /api/application/pipeline
///
/// Runs the batch in the background; the report goes to the log.
pub async fn start_pipeline(
    State(state): State<AppState>,
    Json(input): Json<PipelineRequest>,
) -> Result<(StatusCode, Json<PipelineStarted>), AppError> {
    let query = input.search.to_query()?;
    let (request_id, cancel) = state.batches.start();
    tracing::info!(%request_id, keywords = %query.keyword_string(), "Queued application pipeline");

    let pipeline = state.pipeline.clone();
    let batches = state.batches.clone();
    let profile = input.user_profile;
    tokio::spawn(async move {
        let report = pipeline.run_batch(&query, &profile, &cancel).await;
        batches.finish(request_id);
        tracing::info!(
            %request_id,
            message = %report.message,
            discovered = report.discovered,
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            "Background pipeline finished"
        );
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(PipelineStarted {
            success: true,
            message: "Application pipeline started in background",
            request_id,
        }),
    ))
}

/// DELETE /api/application/pipeline/{id}
pub async fn cancel_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.batches.cancel(id) {
        return Err(AppError::NotFound(format!("No running pipeline with id {id}")));
    }
    tracing::info!(request_id = %id, "Pipeline cancellation requested");
    Ok(Json(serde_json::json!({ "cancelled": true, "request_id": id })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    use crate::routes::api::testing::{
        SinkTransport, call, json_body, post_json, posting_json, profile_json, state,
    };

    #[tokio::test]
    async fn process_sends_one_application() {
        let sink = Arc::new(SinkTransport::default());
        let response = call(
            state(&["{\"fit_score\": 88}", "Dear team,", "Application"], Some(sink.clone())),
            post_json(
                "/api/application/process",
                json!({ "job_posting": posting_json(), "user_profile": profile_json() }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["stage"], "succeeded");
        assert!(body["failed_at"].is_null());
        assert_eq!(body["fit_score"], 88);
        assert_eq!(body["to_email"], "hiring@acmecorp.com");

        let sent = sink.0.lock().unwrap();
        assert_eq!(sent[0].subject, "Application");
        assert!(sent[0].html_body.contains("<p>Dear team,</p>"));
    }

    #[tokio::test]
    async fn process_without_transport_fails_at_dispatch() {
        let response = call(
            state(&[], None),
            post_json(
                "/api/application/process",
                json!({ "job_posting": posting_json(), "user_profile": profile_json() }),
            ),
        )
        .await;

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["stage"], "failed");
        assert_eq!(body["failed_at"], "dispatching");
        assert_eq!(body["fit_score"], 50);
    }

    #[tokio::test]
    async fn pipeline_returns_a_request_id() {
        let response = call(
            state(&[], None),
            post_json(
                "/api/application/pipeline",
                json!({ "keywords": ["rust"], "location": "Remote", "user_profile": profile_json() }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert!(body["request_id"].as_str().unwrap().parse::<uuid::Uuid>().is_ok());
    }

    #[tokio::test]
    async fn cancel_running_pipeline() {
        let app_state = state(&[], None);
        let (id, token) = app_state.batches.start();

        let request = Request::delete(format!("/api/application/pipeline/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = call(app_state, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_unknown_pipeline_is_404() {
        let request = Request::delete(format!("/api/application/pipeline/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let response = call(state(&[], None), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
