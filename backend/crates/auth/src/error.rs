//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. The route gate never surfaces these;
//! it collapses every failure to "unauthenticated". They reach clients only
//! from the explicit auth endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session cookie on the request
    #[error("No active session")]
    SessionMissing,

    /// Session cookie present but unreadable
    #[error("Session cookie is malformed: {0}")]
    SessionMalformed(String),

    /// The identity provider refused the request (4xx).
    ///
    /// `message` is the provider's own text and is shown to users verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The identity provider could not be reached or answered with a 5xx
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// PKCE verifier cookie missing during code exchange
    #[error("Missing code verifier")]
    CodeVerifierMissing,

    /// Request data failed validation
    #[error("{0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::SessionMissing | AuthError::SessionMalformed(_) => ErrorKind::Unauthorized,
            AuthError::Rejected { status, .. } => ErrorKind::from_upstream_status(*status),
            AuthError::Provider(_) => ErrorKind::BadGateway,
            AuthError::CodeVerifierMissing | AuthError::InvalidInput(_) => ErrorKind::BadRequest,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// True when the provider definitively refused the credentials, as
    /// opposed to being unreachable. Stored sessions are discarded only then.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::Rejected { .. } | AuthError::SessionMalformed(_)
        )
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::SessionMissing => err.with_action("Sign in again"),
            AuthError::Provider(_) => err.with_action("Try again in a moment"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Provider(msg) => {
                tracing::error!(message = %msg, "Identity provider failure");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Rejected { status, message } => {
                tracing::info!(status = status, message = %message, "Identity provider rejected request");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_server_error() {
            AuthError::Internal(err.message().to_string())
        } else {
            AuthError::InvalidInput(err.message().to_string())
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(format!("JSON error: {err}"))
    }
}
