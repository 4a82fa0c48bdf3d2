//! Candidate discovery.
//!
//! A [`Scanner`] turns a source directory into a lazy, never-ending stream of
//! [`Candidate`]s. [`feed`] drains that stream into the worker's bounded
//! queue, waiting whenever the queue is full and dropping candidates that are
//! already queued or being processed.

pub mod error;
mod intake;
mod poll;
mod watch;

pub use self::intake::{InFlight, feed};
pub use self::poll::PollScanner;
pub use self::watch::WatchScanner;

use crate::Candidate;
use crate::scan::error::Result;
use futures::Stream;
use std::pin::Pin;

pub type CandidateStream = Pin<Box<dyn Stream<Item = Candidate> + Send>>;

/// A source of candidates.
///
/// Implementations only report files whose base name matches the pattern and
/// never look into subdirectories. They may report the same file more than
/// once.
pub trait Scanner: Send {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Start scanning. Only fails if scanning can't begin at all; once the
    /// stream is handed out, errors are logged and scanning carries on.
    fn candidates(self) -> Result<CandidateStream>;
}
