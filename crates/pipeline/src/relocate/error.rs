//! Error types for the [`relocate`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A relocation error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for relocation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The step of a relocation that failed.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    #[display("guard")]
    Guard,
    #[display("copy")]
    Copy,
    #[display("delete")]
    Delete,
    #[display("tags")]
    Tags,
}

/// Why a single candidate could not be relocated.
///
/// ### Fatal
/// - [`ErrorKind::GuardMisconfigured`]: stops the worker.
///
/// ### Per-candidate
/// Everything else. The candidate is given up on and the worker moves on to
/// the next one.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The destination failed a check in a way waiting won't fix.
    #[display("destination is misconfigured")]
    GuardMisconfigured,
    /// The destination did not become available within the configured wait.
    #[display("timed out waiting for the destination")]
    GuardTimeout,
    /// Shutdown was requested while waiting for the destination, or for the
    /// source to stop changing.
    #[display("cancelled while waiting")]
    Cancelled,
    /// Copying to the destination failed, or a stale copy could not be
    /// cleaned up. The source is untouched.
    #[display("copy failed")]
    Copy,
    /// The copy succeeded but the source could not be removed, so the file
    /// now exists in both places.
    #[display("could not remove the source after copying")]
    Delete,
    /// Reading or writing tags on the relocated file failed.
    #[display("tag backfill failed")]
    Tags,
}

impl ErrorKind {
    pub fn stage(&self) -> Stage {
        match self {
            Self::GuardMisconfigured | Self::GuardTimeout | Self::Cancelled => Stage::Guard,
            Self::Copy => Stage::Copy,
            Self::Delete => Stage::Delete,
            Self::Tags => Stage::Tags,
        }
    }

    /// Returns `true` if the worker has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::GuardMisconfigured)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GuardTimeout | Self::Copy | Self::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::GuardMisconfigured, Stage::Guard, true, false)]
    #[case(ErrorKind::GuardTimeout, Stage::Guard, false, true)]
    #[case(ErrorKind::Cancelled, Stage::Guard, false, false)]
    #[case(ErrorKind::Copy, Stage::Copy, false, true)]
    #[case(ErrorKind::Delete, Stage::Delete, false, true)]
    #[case(ErrorKind::Tags, Stage::Tags, false, false)]
    fn test_classification(#[case] kind: ErrorKind, #[case] stage: Stage, #[case] fatal: bool, #[case] retryable: bool) {
        assert_eq!(kind.stage(), stage);
        assert_eq!(kind.is_fatal(), fatal);
        assert_eq!(kind.is_retryable(), retryable);
    }
}
