//! Moving candidates into the destination.
//!
//! [`relocate_file`] handles a single candidate; [`relocate`] is the worker,
//! turning the intake queue into a stream of [`RelocateEvent`]s.

pub mod error;
mod file;
mod guard;
mod stream;

pub use self::error::{Error, ErrorKind, Stage};
pub use self::file::{Outcome, Relocation, SkipReason, TagStep, relocate_file};
pub use self::guard::DestinationGuard;
pub use self::stream::{RelocateEvent, Summary, relocate};
