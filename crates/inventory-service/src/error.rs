//! Inventory error types.

use backend_client::ApiError;
use thiserror::Error;

/// Inventory operation error type.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// No item with the given id in this organization
    #[error("No item with id {0}")]
    NotFound(i64),

    /// Rejected item fields (negative quantity or threshold, empty name)
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Backend API error
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias using InventoryError.
pub type InventoryResult<T> = Result<T, InventoryError>;
