use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::fit::FitAnalysis;
use crate::models::job::JobPosting;
use crate::models::message::{GeneratedMessage, MessageKind};
use crate::models::outcome::DeliveryReceipt;
use crate::models::profile::ApplicantProfile;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub job_posting: JobPosting,
    pub user_profile: ApplicantProfile,
    #[serde(default)]
    pub email_type: MessageKind,
    pub custom_template: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub email_content: GeneratedMessage,
}

/// POST /api/email/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    input.job_posting.validate()?;

    let message = state
        .generator
        .compose(
            &input.job_posting,
            &input.user_profile,
            input.email_type,
            input.custom_template.as_deref(),
        )
        .await;

    Ok(Json(GenerateResponse {
        success: true,
        email_content: message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub email_content: GeneratedMessage,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub email_sent: DeliveryReceipt,
}

/// POST /api/email/send
///
/// Always 200 once the request parses; delivery problems are in the receipt.
pub async fn send(
    State(state): State<AppState>,
    Json(input): Json<SendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    if input.email_content.recipient_email.trim().is_empty() {
        return Err(AppError::BadRequest("Recipient email is required".to_string()));
    }

    let receipt = state.dispatcher.send(&input.email_content).await;
    Ok(Json(SendResponse {
        success: receipt.success,
        email_sent: receipt,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_posting: JobPosting,
    pub user_profile: ApplicantProfile,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: FitAnalysis,
}

/// POST /api/email/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let analysis = state
        .generator
        .analyze_fit(&input.job_posting, &input.user_profile)
        .await;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::api::testing::{
        SinkTransport, call, json_body, post_json, posting_json, profile_json, state,
    };

    #[tokio::test]
    async fn generate_uses_model_output() {
        let response = call(
            state(&["Dear Acme team,", "Backend Engineer role"], None),
            post_json(
                "/api/email/generate",
                json!({ "job_posting": posting_json(), "user_profile": profile_json() }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["email_content"]["body"], "Dear Acme team,");
        assert_eq!(body["email_content"]["subject"], "Backend Engineer role");
        assert_eq!(body["email_content"]["recipient_email"], "hiring@acmecorp.com");
    }

    #[tokio::test]
    async fn generate_rejects_invalid_posting() {
        let mut posting = posting_json();
        posting["company"] = json!("");
        let response = call(
            state(&[], None),
            post_json(
                "/api/email/generate",
                json!({ "job_posting": posting, "user_profile": profile_json() }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_reports_receipt() {
        let sink = Arc::new(SinkTransport::default());
        let message = json!({
            "subject": "Hello",
            "body": "Hi there",
            "recipient_email": "hiring@acmecorp.com"
        });
        let response = call(
            state(&[], Some(sink.clone())),
            post_json("/api/email/send", json!({ "email_content": message })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["email_sent"]["to_email"], "hiring@acmecorp.com");
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn send_without_transport_fails_in_receipt() {
        let message = json!({ "subject": "Hello", "body": "Hi", "recipient_email": "a@b.com" });
        let response = call(
            state(&[], None),
            post_json("/api/email/send", json!({ "email_content": message })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["email_sent"]["error"].as_str().unwrap().contains("Configuration missing"));
    }

    #[tokio::test]
    async fn analyze_falls_back_when_model_is_down() {
        let response = call(
            state(&[], None),
            post_json(
                "/api/email/analyze",
                json!({ "job_posting": posting_json(), "user_profile": profile_json() }),
            ),
        )
        .await;

        let body = json_body(response).await;
        assert_eq!(body["analysis"]["score"], 50);
        assert_eq!(body["analysis"]["confidence"], "low");
    }
}
