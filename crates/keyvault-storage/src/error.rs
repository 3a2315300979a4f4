//! Error types for the storage crate.

use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("api key {0} not found")]
    NotFound(u64),

    #[error("invalid snapshot document: {0}")]
    Format(String),

    #[error("storage error: {0}")]
    Storage(Box<redb::Error>),

    #[error("corrupted record: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        Self::Storage(Box::new(err))
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Storage(Box::new(err.into()))
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Storage(Box::new(err.into()))
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Storage(Box::new(err.into()))
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Storage(Box::new(err.into()))
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(Box::new(err.into()))
    }
}
