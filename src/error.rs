//! Error taxonomy for the catalog, index and transaction layers.
//!
//! Every variant carries the exact, stable message text its callers
//! rely on; none of it is meant to be further formatted.

use thiserror::Error;

/// Errors returned by [`crate::database::Database`], [`crate::table::Table`]
/// and the index-maintenance protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("index already exists in table: {0}")]
    IndexAlreadyExists(String),

    #[error("column not found in table: {0}")]
    ColumnNotFound(String),

    #[error("key already exists in table: {0}")]
    KeyAlreadyExists(String),

    #[error("key not found in table: {0}")]
    KeyNotFound(String),

    #[error("unique constraint failed: {0}")]
    UniqueConstraintViolation(String),

    #[error("commit failed: base root has advanced")]
    CommitFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
