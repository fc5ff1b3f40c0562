//! Mapping of key outcomes onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use keyledger_license::LicenseError;
use thiserror::Error;
use tracing::debug;

use crate::api::{ErrorResponse, UseKeyResponse};

/// Reported for every rejected duration, whatever the reason.
pub const DURATION_REQUIRED: &str = "Duration is required.";
pub const KEY_NOT_FOUND: &str = "Key not found.";
pub const KEY_ALREADY_USED: &str = "Key is already used.";
pub const KEY_EXPIRED: &str = "Key has expired.";
pub const PREFIX_NOT_TEXT: &str = "Prefix must be a string.";

/// A request that could not be served successfully.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("prefix is not a scalar")]
    InvalidPrefix,

    #[error("key not found")]
    KeyNotFound,

    #[error("key already used")]
    AlreadyUsed,

    #[error("key expired")]
    Expired,
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::InvalidDuration(reason) => Self::InvalidDuration(reason),
            LicenseError::KeyNotFound => Self::KeyNotFound,
        }
    }
}

impl ApiError {
    /// Returns the HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDuration(_) | Self::InvalidPrefix => StatusCode::BAD_REQUEST,
            Self::KeyNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyUsed => StatusCode::CONFLICT,
            Self::Expired => StatusCode::GONE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(error = %self, "request rejected");
        let status = self.status();
        match self {
            Self::InvalidDuration(_) => (
                status,
                Json(ErrorResponse {
                    error: DURATION_REQUIRED.to_string(),
                }),
            )
                .into_response(),
            Self::InvalidPrefix => (
                status,
                Json(ErrorResponse {
                    error: PREFIX_NOT_TEXT.to_string(),
                }),
            )
                .into_response(),
            Self::KeyNotFound => (status, Json(UseKeyResponse::failure(KEY_NOT_FOUND))).into_response(),
            Self::AlreadyUsed => {
                (status, Json(UseKeyResponse::failure(KEY_ALREADY_USED))).into_response()
            }
            Self::Expired => (status, Json(UseKeyResponse::failure(KEY_EXPIRED))).into_response(),
        }
    }
}
