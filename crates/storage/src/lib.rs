//! Filesystem primitives used by the relocation pipeline.
//!
//! Everything in here talks to the local filesystem through absolute paths.
//! Nothing is recursive: listing only ever looks at the direct entries of a
//! single directory.

pub mod error;
mod listing;
mod path;
mod transfer;

pub use crate::listing::{Entry, EntryKind, EntryStream, list, stat, stat_dir};
pub use crate::path::validate_file_name;
pub use crate::transfer::{remove, transfer};
