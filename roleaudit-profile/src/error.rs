//! Error types for record store access
//!
//! Store errors are the only failures the profile builder surfaces. A missing
//! root role is not an error at this level; it is carried by
//! [`Profile::NotFound`](crate::model::Profile::NotFound).

use thiserror::Error;

/// Record store error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The caller may not read the table (ACL denied)
    #[error("Access denied to table: {0}")]
    AccessDenied(String),

    /// The table does not exist on the instance
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Transport-level failure talking to the store
    #[error("Store request failed: {0}")]
    Request(String),

    /// The store answered with something that is not a record payload
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Check whether this error only concerns a single table.
    ///
    /// Identifier resolution skips candidate tables quietly on table-scoped
    /// errors and logs anything else as a warning.
    pub fn is_table_scoped(&self) -> bool {
        matches!(self, StoreError::AccessDenied(_) | StoreError::UnknownTable(_))
    }
}
