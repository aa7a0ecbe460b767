//! Unified error types for macmodels.
//!
//! Every variant here is fatal to a run. Per-code lookup failures are not
//! errors at this level: they are recorded in the database as
//! [`Status::Exception`](crate::Status::Exception) entries.

use std::path::PathBuf;

use crate::codec::IdError;

/// Unified error types for the product database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Product code failed validation.
    #[error("INVALID_ID: {id}: {reason}")]
    InvalidId { id: String, reason: IdError },

    /// Existing database could not be read or decoded.
    #[error("DB_PARSE: failed to parse {}: {reason}", .path.display())]
    DatabaseParse { path: PathBuf, reason: String },

    /// Database could not be written.
    #[error("DB_WRITE: failed to write {}: {reason}", .path.display())]
    DatabaseWrite { path: PathBuf, reason: String },

    /// Database to merge from does not exist.
    #[error("MERGE_MISSING: file {} is missing", .0.display())]
    MergeFileMissing(PathBuf),
}

impl Error {
    pub(crate) fn invalid_id(id: &str, reason: IdError) -> Self {
        Error::InvalidId { id: id.to_string(), reason }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DatabaseParse { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DatabaseWrite { path: path.into(), reason: reason.to_string() }
    }
}
