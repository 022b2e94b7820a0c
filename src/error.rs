//! Error handler for loginform.

use axum::extract::rejection::FormRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors raised by a record store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("record store failed: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry setup failed: {0}")]
    Telemetry(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Form(#[from] FormRejection),

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Form(rejection) => return rejection.into_response(),
            ServerError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_owned(),
            ),
            err => {
                tracing::error!(%err, "server returned 500 status");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_owned(),
                )
            },
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}
