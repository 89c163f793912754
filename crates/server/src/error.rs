//! Structured errors for the doctree HTTP surface.
//!
//! Every variant is reported as `400 Bad Request` with a `{"message": ...}`
//! body. Not-found and storage failures are not distinguished by status.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doctree_core::ErrorKind;
use serde::Serialize;
use tokio::task::JoinError;

pub const LIST_FAILED: &str = "Failed to get a list of documents";
pub const GET_FAILED: &str = "An error occurred while receiving the document";
pub const CREATE_FAILED: &str = "Error when creating a document";
pub const UPDATE_FAILED: &str = "Error when editing a document";
pub const DELETE_FAILED: &str = "An error occurred when deleting the document";

/// Structured errors for the doctree server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Path id is not an integer.
    #[error("Invalid Document ID value")]
    InvalidId,

    /// Request body is not a JSON document draft.
    #[error("Failed to decode request")]
    Decode(#[source] JsonRejection),

    /// `ids` query parameter is not a JSON array of integers.
    #[error("Invalid ids")]
    InvalidIds,

    /// Draft rejected by validation.
    #[error("{0}")]
    Validation(String),

    /// Store operation failed.
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: doctree_core::Error,
    },

    /// A list processing task panicked or was cancelled.
    #[error("{}", LIST_FAILED)]
    Task(#[from] JoinError),
}

impl ApiError {
    /// Map a core error to the public message for the failing handler.
    ///
    /// Validation failures keep their own message.
    pub fn failed(message: &'static str) -> impl FnOnce(doctree_core::Error) -> ApiError {
        move |source| {
            if let doctree_core::Error::Validation(reason) = source.root() {
                return ApiError::Validation(reason.clone());
            }
            ApiError::Failed { message, source }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Decode(rejection)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Failed { message, source } => match source.kind() {
                ErrorKind::NotFound => tracing::warn!(error = %source, "{message}"),
                _ => tracing::error!(error = %source, op = ?source.operation(), "{message}"),
            },
            ApiError::Task(err) => tracing::error!(error = %err, "list processing task failed"),
            ApiError::Decode(rejection) => tracing::debug!(error = %rejection, "rejected request body"),
            other => tracing::debug!(error = %other, "rejected request"),
        }

        (StatusCode::BAD_REQUEST, Json(ErrorBody { message: self.to_string() })).into_response()
    }
}
