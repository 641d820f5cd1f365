//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};
use triage_store::StoreError;

pub const ISSUE_BODY_REQUIRED: &str = "issue_body is required";
pub const CORRECTION_FIELDS_REQUIRED: &str = "Both id and corrected_label are required";
pub const PREDICTION_NOT_FOUND: &str = "Prediction not found";
pub const ALREADY_CORRECTED: &str = "Prediction already corrected";

/// Failure of a request, rendered as `{"error": message}`
#[derive(Debug)]
pub enum AppError {
    /// Missing or blank required field (400)
    Validation(&'static str),
    /// Unknown prediction id (404)
    NotFound,
    /// Request conflicts with the stored record (409)
    Conflict(String),
    /// Anything else; the message is passed through to the client (500)
    Internal(String),
}

impl From<triage_core::Error> for AppError {
    fn from(err: triage_core::Error) -> Self {
        match err {
            triage_core::Error::NotFound(_) => AppError::NotFound,
            triage_core::Error::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound,
            StoreError::AlreadyCorrected(_) => AppError::Conflict(ALREADY_CORRECTED.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, PREDICTION_NOT_FOUND.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        if status.is_client_error() {
            warn!("Rejected request ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation(ISSUE_BODY_REQUIRED), StatusCode::BAD_REQUEST),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::from(StoreError::AlreadyCorrected("x".into())), StatusCode::CONFLICT),
            (
                AppError::from(triage_core::Error::classifier("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
