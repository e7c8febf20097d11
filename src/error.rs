//! Error types surfaced to HTTP callers.
//!
//! Gate denials are not errors in this sense: they never carry a code. The
//! types here are the ones a legitimate client is allowed to tell apart.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::security::UnknownBanKind;
use crate::storage::StorageError;

// ============================================================================
// Download Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("unknown artifact: {0}")]
    ArtifactNotConfigured(String),

    #[error("challenge verification failed")]
    ChallengeFailed,

    #[error("artifact file missing: {0}")]
    ArtifactMissing(String),

    #[error("counter update failed: {0}")]
    CounterWriteFailed(String),

    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),
}

impl DownloadError {
    /// Get a static error code string for the response body and metrics.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ArtifactNotConfigured(_) => "unknown_macro",
            Self::ChallengeFailed => "captcha_failed",
            Self::ArtifactMissing(_) => "missing_file",
            Self::CounterWriteFailed(_) => "stats_update_failed",
            Self::Stream(_) => "download_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ArtifactNotConfigured(_) => StatusCode::NOT_FOUND,
            Self::ChallengeFailed => StatusCode::FORBIDDEN,
            Self::ArtifactMissing(_) | Self::CounterWriteFailed(_) | Self::Stream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StorageError> for DownloadError {
    fn from(e: StorageError) -> Self {
        Self::CounterWriteFailed(e.to_string())
    }
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.error_code() }))).into_response()
    }
}

// ============================================================================
// Admin Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    InvalidType(#[from] UnknownBanKind),

    #[error("value must not be empty")]
    EmptyValue,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AdminError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidType(_) => "invalid_type",
            Self::EmptyValue => "empty_value",
            Self::InvalidBody(_) => "invalid_body",
            Self::Storage(_) => "storage_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidType(_) | Self::EmptyValue | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            tracing::error!(error = %e, "Admin storage operation failed");
        }
        (self.status(), Json(json!({ "error": self.error_code() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_codes_and_statuses() {
        let cases = [
            (DownloadError::ArtifactNotConfigured("x".into()), "unknown_macro", 404),
            (DownloadError::ChallengeFailed, "captcha_failed", 403),
            (DownloadError::ArtifactMissing("x".into()), "missing_file", 500),
            (DownloadError::CounterWriteFailed("db".into()), "stats_update_failed", 500),
            (
                DownloadError::Stream(std::io::Error::other("reset")),
                "download_error",
                500,
            ),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.error_code(), code);
            assert_eq!(err.status().as_u16(), status);
        }
    }

    #[test]
    fn admin_codes() {
        let err = AdminError::from(UnknownBanKind("ip".into()));
        assert_eq!(err.error_code(), "invalid_type");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AdminError::EmptyValue.error_code(), "empty_value");
    }
}
