//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::CompareError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<CompareError> for ApiError {
    fn from(err: CompareError) -> Self {
        match err {
            CompareError::EmptyPrompt => ApiError::InvalidRequest(err.to_string()),
            CompareError::MissingCredentials(_) => ApiError::Configuration(err.to_string()),
            CompareError::Provider(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Uniform error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderFamily;
    use crate::services::ProviderError;

    #[test]
    fn test_compare_errors_map_to_status() {
        let empty: ApiError = CompareError::EmptyPrompt.into();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.to_string(), "No prompt provided");

        let config: ApiError = CompareError::MissingCredentials(vec![ProviderFamily::Gemini]).into();
        assert!(matches!(config, ApiError::Configuration(_)));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream: ApiError = CompareError::Provider(ProviderError::Upstream {
            family: ProviderFamily::Gemini,
            model: "gemini-1.5-pro".into(),
            status: Some(503),
            message: "unavailable".into(),
        })
        .into();
        assert_eq!(
            upstream.to_string(),
            "Gemini API error for gemini-1.5-pro: 503 unavailable"
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::InvalidRequest("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::Internal(anyhow::anyhow!("oops")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
