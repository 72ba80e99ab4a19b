use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream quota exhausted for {0}")]
    QuotaExhausted(String),

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("mail delivery error: {0}")]
    Mail(String),

    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::QuotaExhausted(endpoint) => {
                tracing::warn!(endpoint = %endpoint, "upstream quota exhausted");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    format!("upstream quota exhausted for {endpoint}, retry later"),
                )
            }
            AppError::Http(e) => {
                tracing::error!(error = %e, "upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream request failed".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream request failed".to_string(),
                )
            }
            AppError::Mail(msg) => {
                tracing::error!(error = %msg, "mail delivery failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "failed to deliver message".to_string(),
                )
            }
            AppError::Unconfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{what} is not configured"),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
