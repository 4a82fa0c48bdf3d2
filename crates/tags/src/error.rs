//! Tag Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A tag error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for tag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be opened or its tags could not be parsed.
    #[display("failed to read tags: {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The file format does not support a writable tag container.
    #[display("no writable tag container: {}", _0.display())]
    Unsupported(#[error(not(source))] PathBuf),
    /// Writing the updated tags back to the file failed.
    #[display("failed to write tags: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Tags are either readable or they're not; a write failure might be
        // a transient I/O problem.
        matches!(self, Self::Write(_))
    }
}
