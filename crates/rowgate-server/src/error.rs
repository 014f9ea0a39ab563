//! Gateway error type and its HTTP mapping.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rowgate_sheets::SheetsError;

use crate::response::Envelope;

/// Every failure a row operation can report.
///
/// Authentication, transport, range and input problems all collapse into one
/// message returned with HTTP 500; callers cannot tell retryable failures
/// from fatal ones.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    RemoteOperationFailure(String),
}

impl GatewayError {
    pub fn message(&self) -> &str {
        match self {
            Self::RemoteOperationFailure(msg) => msg,
        }
    }
}

impl From<SheetsError> for GatewayError {
    fn from(err: SheetsError) -> Self {
        Self::RemoteOperationFailure(err.to_string())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::RemoteOperationFailure(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        Self::RemoteOperationFailure(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Row operation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::error(self.message())),
        )
            .into_response()
    }
}
