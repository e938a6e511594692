//! JSON error responder for the REST boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domains::stores::OnboardingError;

/// An error ready to be rendered as a JSON response.
///
/// Every error carries a human-readable message, not just a code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        let status = match &err {
            OnboardingError::MissingField(_)
            | OnboardingError::UnknownPlatform(_)
            | OnboardingError::InvalidSyncMode(_) => StatusCode::BAD_REQUEST,
            OnboardingError::CredentialsRejected => StatusCode::UNPROCESSABLE_ENTITY,
            OnboardingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "Onboarding failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{:#}", err), "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err: ApiError = OnboardingError::MissingField("credentials").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("credentials"));
    }

    #[test]
    fn rejected_credentials_map_to_unprocessable() {
        let err: ApiError = OnboardingError::CredentialsRejected.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
