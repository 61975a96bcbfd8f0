use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// `context` is the message the client sees; the cause only goes to the log
    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to render page")]
    Render(#[from] askama::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_id() -> Self {
        Self::validation("Invalid ID format")
    }

    pub fn no_todo(id: impl Display) -> Self {
        Self::NotFound(format!("No todo with ID {}", id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal { context, source } => error!(error = %source, "{}", context),
            AppError::Render(source) => error!(error = %source, "template rendering failed"),
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Attach the client-facing message to a store failure
pub trait StoreContext<T> {
    fn context(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Internal { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::invalid_id().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::no_todo("abc").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_message_hides_cause() {
        let res: Result<(), StoreError> = Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        let err = res.context("Failed to fetch todos").unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch todos");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_render_failure_is_500() {
        let err = AppError::from(askama::Error::Fmt(std::fmt::Error));

        assert_eq!(err.to_string(), "Failed to render page");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
