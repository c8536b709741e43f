use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::eligibility::AccessDenial;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    Forbidden {
        error_code: &'static str,
        message: String,
    },

    #[error("{message}")]
    NotFound {
        error_code: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AccessDenial> for AppError {
    fn from(denial: AccessDenial) -> Self {
        AppError::Forbidden {
            error_code: denial.error_code(),
            message: denial.message().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some("BAD_REQUEST"), msg),
            AppError::Forbidden {
                error_code,
                message,
            } => (StatusCode::FORBIDDEN, Some(error_code), message),
            AppError::NotFound {
                error_code,
                message,
            } => (StatusCode::NOT_FOUND, Some(error_code), message),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, Some("CONFLICT"), msg),
            AppError::Internal(err) => {
                // Don't leak internal error detail to client
                error!(error = ?err, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            error_code,
        });

        (status, body).into_response()
    }
}
