use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::game::coordinator::CoordinatorError;
use crate::ledger::query::{LatestSnapshotError, MessagesQueryError};

const LOG_TARGET: &str = "server::error";

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<LatestSnapshotError> for ApiError {
    fn from(err: LatestSnapshotError) -> Self {
        match err {
            LatestSnapshotError::HandNotFound { .. } => ApiError::NotFound,
            LatestSnapshotError::Corrupt { .. } | LatestSnapshotError::Database => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<MessagesQueryError> for ApiError {
    fn from(err: MessagesQueryError) -> Self {
        match err {
            MessagesQueryError::InvalidBounds(_) => ApiError::bad_request(err.to_string()),
            MessagesQueryError::Store(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::HandNotFound(_) => ApiError::NotFound,
            CoordinatorError::Action(action_err) => ApiError::bad_request(action_err.to_string()),
            CoordinatorError::State(state_err) => ApiError::internal(state_err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                error!(target = LOG_TARGET, %message, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}
