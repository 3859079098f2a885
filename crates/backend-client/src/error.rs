//! Backend API error types.

use thiserror::Error;

/// Backend API error type.
///
/// Three classes matter to callers: configuration (backend coordinates
/// missing), auth failures (bad credentials, weak password, taken slug),
/// and network failures. UI layers render each class differently, so the
/// adapter never collapses them into a single string.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend URL or anon key missing at process start
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    /// Invalid email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Password rejected by the backend's strength policy
    #[error("Password rejected: {0}")]
    WeakPassword(String),

    /// Organization slug already claimed
    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    /// No session available for an operation that requires one
    #[error("Not signed in")]
    NotLoggedIn,

    /// Session was invalidated server-side (revoked, logged out elsewhere)
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Any other auth-layer rejection
    #[error("Auth error: {0}")]
    Auth(String),

    /// Row-layer rejection that is not a recognized constraint violation
    #[error("Record error: {0}")]
    Record(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Network unavailable (transient, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Returns true if this error is transient and the operation can be
    /// retried: connection failures, timeouts, and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::NetworkUnavailable => true,
            ApiError::Timeout => true,
            ApiError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }

    /// Returns true for the configuration class (render a "not configured"
    /// state with a retry affordance, never placeholder data).
    pub fn is_configuration(&self) -> bool {
        matches!(self, ApiError::NotConfigured(_))
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
