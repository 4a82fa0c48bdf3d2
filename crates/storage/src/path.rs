//! File name validation.
//!
//! Candidates are relocated by joining their base name onto the destination
//! directory, so the name must not be able to point anywhere else.

use std::ffi::OsStr;
use std::path::{Component, Path};

use crate::error::{ErrorKind, Result};

/// Validates that `name` is a single, plain path component.
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::ffi::OsStr;
/// use tunedrop_storage::validate_file_name;
/// assert!(validate_file_name(OsStr::new("Artist - Title.mp3")).is_ok());
/// assert!(validate_file_name(OsStr::new("../escape.mp3")).is_err());
/// assert!(validate_file_name(OsStr::new("nested/track.mp3")).is_err());
/// ```
pub fn validate_file_name(name: &OsStr) -> Result<&OsStr> {
    let invalid = || ErrorKind::InvalidPath(Path::new(name).to_path_buf());
    let mut components = Path::new(name).components();
    let (Some(Component::Normal(only)), None) = (components.next(), components.next()) else {
        exn::bail!(invalid());
    };
    // Null bytes pass through Path::components() on Unix but cause
    // truncation in C-based syscalls.
    if only.as_encoded_bytes().contains(&0) {
        exn::bail!(invalid());
    }
    Ok(only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Song.mp3")]
    #[case("Artist - Title.flac")]
    #[case(".hidden.mp3")]
    #[case("no-extension")]
    fn test_valid_names(#[case] name: &str) {
        assert_eq!(validate_file_name(OsStr::new(name)).unwrap(), OsStr::new(name));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("/")]
    #[case("/etc/passwd")]
    #[case("../up.mp3")]
    #[case("Album/Song.mp3")]
    #[case("a\0b.mp3")]
    fn test_invalid_names(#[case] name: &str) {
        assert!(validate_file_name(OsStr::new(name)).is_err());
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        // Path::components() drops trailing separators.
        assert_eq!(validate_file_name(OsStr::new("Song.mp3/")).unwrap(), OsStr::new("Song.mp3"));
    }
}
