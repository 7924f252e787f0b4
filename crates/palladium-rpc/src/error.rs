//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use palladium_mining::MiningError;
use serde::Serialize;
use thiserror::Error;

/// API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request body or arguments.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A parameter was syntactically valid but unacceptable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation itself is not valid in the current chain state.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Submitted data failed to deserialize.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Validation failed with a definite verdict.
    #[error("verify error: {0}")]
    VerifyError(String),

    /// Internal failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Node is shutting down.
    #[error("shutting down")]
    ShuttingDown,
}

impl From<MiningError> for ApiError {
    fn from(err: MiningError) -> Self {
        match err {
            MiningError::InvalidLongPollId(id) => {
                ApiError::InvalidParameter(format!("invalid longpollid format: {}", id))
            }
            MiningError::InvalidRequest(msg) => ApiError::InvalidParameter(msg),
            MiningError::HeaderSubmissionWithAuxpow => ApiError::InvalidRequest(
                "submitheader is incompatible with active auxpow".to_string(),
            ),
            MiningError::UnknownPrev => {
                ApiError::VerifyError("previous block not known".to_string())
            }
            MiningError::HeaderRejected(state) => ApiError::VerifyError(state),
            MiningError::GenerateDisabled => {
                ApiError::BadRequest("block generation is only available on regtest".to_string())
            }
            MiningError::OutOfTries => ApiError::Internal("ran out of tries".to_string()),
            MiningError::ShuttingDown => ApiError::ShuttingDown,
            MiningError::Consensus(err) => ApiError::VerifyError(err.to_string()),
            MiningError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: u16,
    reason: String,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "Invalid Parameter"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid Request"),
            ApiError::Deserialization(_) => (StatusCode::BAD_REQUEST, "Deserialization Error"),
            ApiError::VerifyError(_) => (StatusCode::BAD_REQUEST, "Verify Error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            ApiError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "Shutting Down"),
        };
        let body = ErrorResponse {
            error: status.as_u16(),
            reason: reason.to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
