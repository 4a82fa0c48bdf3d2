use regex::{Regex, RegexBuilder};
use std::ffi::OsStr;
use std::path::Path;

/// The file name rule shared by the scanner and the worker.
///
/// Always case-insensitive, always applied to the base name only.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(expression: &str) -> Result<Self, regex::Error> {
        Ok(Self(RegexBuilder::new(expression).case_insensitive(true).build()?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Test a base name. Names that aren't valid UTF-8 are matched lossily.
    pub fn matches(&self, name: &OsStr) -> bool {
        self.0.is_match(&name.to_string_lossy())
    }

    /// Test the base name of `path`; paths without one (`/`, `..`) never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.matches(name))
    }
}
