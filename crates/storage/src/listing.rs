//! Directory listing and stat helpers.
//!
//! Uses `tokio::fs` for async I/O. Listing is deliberately shallow: the
//! direct entries of one directory, never its subdirectories' contents.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::Stream;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;
use tokio::fs::{self, DirEntry};

pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, fifos... anything we won't relocate.
    Other,
}
impl From<&Metadata> for EntryKind {
    fn from(metadata: &Metadata) -> Self {
        if metadata.is_file() {
            Self::File
        } else if metadata.is_dir() {
            Self::Directory
        } else {
            Self::Other
        }
    }
}

/// A single directory entry, as seen at the time of listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path of the entry.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Size in bytes (meaningless for directories).
    pub size: u64,
    /// Last modification time, where the platform reports one.
    pub modified: Option<SystemTime>,
}
impl Entry {
    fn new(path: PathBuf, metadata: &Metadata) -> Self {
        Self { path, kind: EntryKind::from(metadata), size: metadata.len(), modified: metadata.modified().ok() }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

async fn process_entry(entry: DirEntry) -> Result<Entry> {
    let path = entry.path();
    // DirEntry::metadata() does not traverse symlinks.
    let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &path))?;
    Ok(Entry::new(path, &metadata))
}

/// Stream the direct entries of `dir`.
///
/// A failure to open the directory is yielded once and ends the stream;
/// failures on individual entries are yielded and the listing carries on.
pub fn list(dir: &Path) -> EntryStream<'_> {
    Box::pin(stream! {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                yield Err(exn::Exn::from(ErrorKind::from_io(err, dir)));
                return;
            },
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => { yield Err(exn::Exn::from(ErrorKind::from_io(e, dir))); continue; },
            };
            yield process_entry(entry).await;
        }
    })
}

/// Get metadata for a single path without following symlinks.
///
/// Returns [`NotFound`](ErrorKind::NotFound) if nothing exists at `path`.
pub async fn stat(path: &Path) -> Result<Entry> {
    let metadata = fs::symlink_metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    Ok(Entry::new(path.to_path_buf(), &metadata))
}

/// Confirm that `path` exists and is a directory (following symlinks, so a
/// mount point reached through a link still counts).
pub async fn stat_dir(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::ops::Deref;

    #[tokio::test]
    async fn test_list_is_shallow() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("Song.mp3"), b"data").unwrap();
        std::fs::create_dir(temp_dir.path().join("Album")).unwrap();
        std::fs::write(temp_dir.path().join("Album/Nested.mp3"), b"data").unwrap();

        let mut entries: Vec<Entry> = list(temp_dir.path()).try_collect().await.unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, temp_dir.path().join("Album"));
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].path, temp_dir.path().join("Song.mp3"));
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size, 4);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries: Vec<Entry> = list(temp_dir.path()).try_collect().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_directory_yields_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("gone");
        let results: Vec<Result<Entry>> = futures::StreamExt::collect(list(&missing)).await;
        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotFound(p) if *p == missing));
    }

    #[tokio::test]
    async fn test_stat() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("Song.mp3");
        std::fs::write(&file, b"Hello, world!").unwrap();
        let entry = stat(&file).await.unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size, 13);
        assert!(entry.modified.is_some());
        assert_eq!(stat(temp_dir.path()).await.unwrap().kind, EntryKind::Directory);
        let err = stat(&temp_dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stat_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(stat_dir(temp_dir.path()).await.is_ok());

        let missing = temp_dir.path().join("unmounted");
        let err = stat_dir(&missing).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotFound(_)));

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, b"data").unwrap();
        let err = stat_dir(&file).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotADirectory(_)));
    }
}
