//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Scanning only fails outright when it can't get started. Failures to list
/// the source directory on a given pass are logged and the next pass tries
/// again.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Subscribing to filesystem events for the directory failed.
    #[display("could not watch {}", _0.display())]
    Watch(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Watch(_))
    }
}
