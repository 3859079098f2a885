//! Auth context error types.

use backend_client::ApiError;
use stockpulse_storage::StoreError;
use thiserror::Error;

/// Auth context error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The context has been shut down
    #[error("Auth context is shut down")]
    Closed,

    /// No signed-in user for an operation that requires one
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid phase transition (e.g., bootstrap called twice)
    #[error("Invalid auth phase transition: {0}")]
    InvalidTransition(String),

    /// Backend API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
