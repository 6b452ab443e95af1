//! Error responses.
//!
//! Every tournament error carries an [`ErrorCode`]; the code picks the HTTP
//! status and is echoed in the body so clients can branch on it without
//! parsing messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tourney::tournament::{ErrorCode, TournamentError};

use crate::{logging, metrics};

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
}

/// Error returned by API handlers and extractors
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    /// Log and count a failed operation, then convert it for the client
    pub fn from_operation(
        operation: &str,
        tournament_id: Option<&str>,
        err: TournamentError,
    ) -> Self {
        logging::log_operation_error(operation, tournament_id, &err);
        metrics::operation_errors_total(operation, err.code());
        Self::from(err)
    }
}

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        Self {
            code: err.code(),
            message: err.client_message(),
        }
    }
}

/// HTTP status for an error code
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::FailedPrecondition => StatusCode::CONFLICT,
        ErrorCode::Aborted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::Unimplemented => StatusCode::NOT_IMPLEMENTED,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code,
            message: self.message,
        };
        (status_for(self.code), Json(body)).into_response()
    }
}
