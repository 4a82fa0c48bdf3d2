//! Copying files between directories.
//!
//! A transfer never leaves a half-written file at its destination: bytes are
//! streamed into a hidden temporary file next to the destination, flushed to
//! disk, and only then renamed into place. If anything fails before the
//! rename, the temporary file is removed when it is dropped.
//!
//! A source that is written to while it is being copied fails the transfer
//! with [`Changed`](ErrorKind::Changed) and nothing is renamed into place.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::instrument;

const STAGING_PREFIX: &str = ".tunedrop-";
const STAGING_SUFFIX: &str = ".partial";

/// Size and modification time of an open file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Snapshot {
    size: u64,
    modified: Option<SystemTime>,
}
impl From<&Metadata> for Snapshot {
    fn from(metadata: &Metadata) -> Self {
        Self { size: metadata.len(), modified: metadata.modified().ok() }
    }
}

/// The copy is good if the source looked the same before and after, and
/// every byte of it was copied.
fn consistent(before: Snapshot, after: Snapshot, bytes: u64) -> bool {
    before == after && bytes == after.size
}

fn transfer_blocking(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader = File::open(source).map_err(|e| ErrorKind::from_io(e, source))?;
    let metadata = reader.metadata().map_err(|e| ErrorKind::from_io(e, source))?;
    let before = Snapshot::from(&metadata);

    let parent = destination.parent().ok_or_raise(|| ErrorKind::InvalidPath(destination.to_path_buf()))?;
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| ErrorKind::from_io(e, parent))?;

    let bytes = io::copy(&mut reader, staged.as_file_mut()).map_err(ErrorKind::Io)?;
    staged.as_file().sync_all().map_err(ErrorKind::Io)?;
    let after = Snapshot::from(&reader.metadata().map_err(|e| ErrorKind::from_io(e, source))?);
    if !consistent(before, after, bytes) {
        tracing::debug!(source = %source.display(), ?before, ?after, bytes, "Source changed during transfer");
        exn::bail!(ErrorKind::Changed(source.to_path_buf()));
    }
    // Temporary files are created owner-only; the relocated file should look
    // like the original did.
    fs::set_permissions(staged.path(), metadata.permissions()).map_err(ErrorKind::Io)?;

    staged.persist(destination).map_err(|e| ErrorKind::from_io(e.error, destination))?;
    tracing::trace!(source = %source.display(), destination = %destination.display(), bytes, "Transfer complete");
    Ok(bytes)
}

/// Copy `source` to `destination`, creating or replacing `destination`.
///
/// Returns the number of bytes copied. The source file is never modified;
/// deleting it is the caller's decision (see [`remove`]). The copy runs on
/// Tokio's blocking pool.
///
/// # Errors
/// [`Changed`](ErrorKind::Changed) if the source's size or modification time
/// moved while it was being copied. `destination` is left as it was.
#[instrument(level = "debug", skip_all, fields(source = %source.display(), destination = %destination.display()))]
pub async fn transfer(source: PathBuf, destination: PathBuf) -> Result<u64> {
    tokio::task::spawn_blocking(move || transfer_blocking(&source, &destination))
        .await
        .map_err(|e| ErrorKind::Io(e.into()))?
}

/// Delete a file.
///
/// Returns [`NotFound`](ErrorKind::NotFound) if the file does not exist.
pub async fn remove(path: &Path) -> Result<()> {
    Ok(tokio::fs::remove_file(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
}
