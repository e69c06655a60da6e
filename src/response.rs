use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::scaffolding::ScaffoldError;
use crate::services::session_registry::SessionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = %self.code, error = %self.message, "request failed");
        }

        let body = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<ScaffoldError> for AppError {
    fn from(err: ScaffoldError) -> Self {
        match err {
            ScaffoldError::InvalidLevelRequest(_) => {
                json_error(StatusCode::BAD_REQUEST, "INVALID_LEVEL_REQUEST", err.to_string())
            }
            ScaffoldError::InvalidConfig(_) => Self::validation(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => {
                json_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", err.to_string())
            }
            SessionError::LimitReached(_) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, "SESSION_LIMIT", err.to_string())
            }
            SessionError::Scaffold(inner) => inner.into(),
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
    }
}
