use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use retire_core::error::{EngineError, FieldError};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

impl From<FieldError> for FieldErrorBody {
    fn from(e: FieldError) -> Self {
        Self {
            field: e.field,
            message: e.message,
        }
    }
}

/// Error type for every RPC handler in this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{} validation error(s)", .errors.len())]
    Validation {
        errors: Vec<FieldErrorBody>,
        warnings: Vec<String>,
    },

    #[error("simulation exceeded the allotted time budget")]
    Timeout,

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("mutex lock error")]
    LockError,

    #[error("internal server error")]
    InternalError,
}

impl<T> From<std::sync::PoisonError<T>> for ApiError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ApiError::LockError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Validation { errors, warnings } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors, "warnings": warnings })),
            )
                .into_response(),

            ApiError::Timeout | ApiError::Engine(EngineError::Timeout) => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": "simulation exceeded the allotted time budget" })),
            )
                .into_response(),

            ApiError::Engine(EngineError::NumericalFailureRateExceeded { .. }) => {
                tracing::error!(%message, "numerical failure rate exceeded tolerance");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }

            ApiError::Engine(EngineError::Worker(reason)) => {
                tracing::error!(%reason, "worker execution failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "worker execution failed" })),
                )
                    .into_response()
            }

            ApiError::Engine(EngineError::Configuration(reason)) => {
                tracing::error!(%reason, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "server misconfigured" })),
                )
                    .into_response()
            }

            ApiError::Engine(EngineError::Validation(fields)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errors": fields.into_iter().map(FieldErrorBody::from).collect::<Vec<_>>(),
                    "warnings": Vec::<String>::new(),
                })),
            )
                .into_response(),

            ApiError::LockError => {
                tracing::error!("mutex lock poisoned");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }

            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
