use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::workflow::WorkflowError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "resource not found")
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Validation(message) => AppError::bad_request(message),
            WorkflowError::Authorization(message) => AppError::forbidden(message),
            WorkflowError::InvalidState(message) | WorkflowError::Conflict(message) => {
                AppError::conflict(message)
            }
            WorkflowError::NotFound(message) => AppError::new(StatusCode::NOT_FOUND, message),
            WorkflowError::Storage(diesel::result::Error::NotFound) => AppError::not_found(),
            other @ (WorkflowError::Corrupt(_) | WorkflowError::Storage(_)) => {
                AppError::internal(other)
            }
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_errors_map_to_http_statuses() {
        let cases = [
            (WorkflowError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (WorkflowError::Authorization("no".into()), StatusCode::FORBIDDEN),
            (WorkflowError::InvalidState("later".into()), StatusCode::CONFLICT),
            (WorkflowError::Conflict("taken".into()), StatusCode::CONFLICT),
            (WorkflowError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (WorkflowError::Corrupt("??".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                WorkflowError::Storage(diesel::result::Error::BrokenTransactionManager),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn keeps_engine_message() {
        let err = AppError::from(WorkflowError::Validation(
            "remarks are required when rejecting a contract".into(),
        ));
        assert_eq!(err.message(), "remarks are required when rejecting a contract");
    }
}
