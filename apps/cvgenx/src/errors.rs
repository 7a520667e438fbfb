use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;

/// Application-level error type shared by the CLI and the HTTP surface.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or rejected credential. The user must fix settings before retrying.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream generation failed. Retrying unchanged may succeed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Empty or malformed input to document export.
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Conversion(e.to_string())
    }
}

/// Malformed or mistyped JSON bodies are validation failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// `Json<T>` body extractor whose rejection is an `AppError`, so bad bodies
/// get the same `{"error":{..}}` shape and 400 status as other input errors.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state).await?;
        Ok(ValidatedJson(inner))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Configuration(msg) => (
                StatusCode::BAD_REQUEST,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg.clone())
            }
            AppError::Conversion(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CONVERSION_ERROR",
                msg.clone(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
