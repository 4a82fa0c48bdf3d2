//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The [`scan`](crate::scan) and
//! [`relocate`](crate::relocate) modules carry their own error kinds, which
//! surface here as the source of a [`Scan`](ErrorKind::Scan) or
//! [`Relocate`](ErrorKind::Relocate) error.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons the pipeline as a whole stopped.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration can't be turned into a running pipeline (for
    /// example, the file name pattern does not compile).
    #[display("invalid pipeline configuration")]
    Config,
    /// The source scanner could not start, or died.
    #[display("source scanner failed")]
    Scan,
    /// The relocation worker hit an unrecoverable condition.
    #[display("relocation worker failed")]
    Relocate,
}

