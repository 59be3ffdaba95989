use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Source '{site}' unavailable: {reason}")]
    SourceUnavailable { site: String, reason: String },

    #[error("Listing is missing required field '{0}'")]
    ExtractionIncomplete(&'static str),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn source_unavailable(site: impl Into<String>, reason: impl ToString) -> Self {
        AppError::SourceUnavailable {
            site: site.into(),
            reason: reason.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ConfigurationMissing(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::SourceUnavailable { .. } | AppError::Http(_) | AppError::Timeout(..) => {
                tracing::warn!("Upstream error: {self}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            _ => {
                tracing::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response = AppError::BadRequest("no keywords".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_configuration_maps_to_503() {
        let response = AppError::ConfigurationMissing("SMTP_USERNAME".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn timeout_message_names_the_stage() {
        let err = AppError::Timeout("dispatch", Duration::from_secs(30));
        assert_eq!(err.to_string(), "dispatch timed out after 30s");
    }
}
