use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::{providers::ProviderError, recommendations::ExtractError};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(#[source] ProviderError),

    #[error("Completion failed: {0}")]
    CompletionFailed(#[source] ProviderError),

    #[error("Failed to parse AI recommendations: {source}")]
    Parse {
        #[source]
        source: ExtractError,
        raw_response: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CatalogUnavailable(_)
            | AppError::CompletionFailed(_)
            | AppError::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::CatalogUnavailable(e) => json!({
                "error": "Failed to fetch movie data",
                "details": e.to_string(),
            }),
            AppError::CompletionFailed(e) => json!({
                "error": "Failed to generate recommendations",
                "details": e.to_string(),
            }),
            AppError::Parse {
                source,
                raw_response,
            } => json!({
                "error": "Failed to parse AI recommendations",
                "details": source.to_string(),
                "rawResponse": raw_response,
            }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (status, body) =
            body_json(AppError::InvalidInput("Invalid favorites data".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid favorites data" }));
    }

    #[tokio::test]
    async fn test_parse_failure_carries_raw_response() {
        let (status, body) = body_json(AppError::Parse {
            source: ExtractError::NoJsonObject,
            raw_response: "sorry, no can do".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to parse AI recommendations");
        assert_eq!(body["rawResponse"], "sorry, no can do");
        assert!(body["details"].as_str().unwrap().contains("No JSON object"));
    }

    #[tokio::test]
    async fn test_catalog_failure_has_details() {
        let (status, body) = body_json(AppError::CatalogUnavailable(ProviderError::Status {
            status: 503,
            body: "down".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch movie data");
        assert!(body["details"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_server_errors_always_carry_details() {
        let errors = [
            AppError::CatalogUnavailable(ProviderError::EmptyCompletion),
            AppError::CompletionFailed(ProviderError::Status {
                status: 429,
                body: "slow down".to_string(),
            }),
            AppError::Parse {
                source: ExtractError::InvalidShape("missing array".to_string()),
                raw_response: "{}".to_string(),
            },
        ];

        for error in errors {
            let (status, body) = body_json(error).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body["error"].is_string());
            assert!(body["details"].is_string());
        }
    }
}
