//! Artist/title backfill for relocated audio files.
//!
//! Reading and writing go through [`lofty`], which picks the container
//! (ID3v2, Vorbis comments, MP4 atoms, ...) based on the file format.

mod backfill;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
mod name;

pub use crate::backfill::{Backfill, backfill, read_tags};
pub use crate::name::{TagSet, parse_file_name};
