use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// A file the scanner thinks should be relocated.
///
/// Nothing about the file is captured beyond its path: by the time the worker
/// gets to it, it may have changed or disappeared, and the worker checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub discovered_at: UtcDateTime,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), discovered_at: UtcDateTime::now() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }
}
