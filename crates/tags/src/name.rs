use regex::Regex;
use std::sync::LazyLock;

/// `<Artist> - <Title>.<ext>`; the artist is the shortest prefix before the
/// first " - ", everything up to the final extension is the title.
static FILE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<artist>.+?) - (?P<title>.+)\.[^.]+$").unwrap());

/// The two tags tunedrop cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    pub artist: String,
    pub title: String,
}
impl TagSet {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self { artist: artist.into(), title: title.into() }
    }

    /// Both artist and title are empty (whitespace counts as empty).
    pub fn is_empty(&self) -> bool {
        self.artist.trim().is_empty() && self.title.trim().is_empty()
    }
}

/// Derive a [`TagSet`] from a file name shaped like `Artist - Title.ext`.
///
/// Returns `None` for anything else; values are never made up.
pub fn parse_file_name(file_name: &str) -> Option<TagSet> {
    let captures = FILE_NAME_REGEX.captures(file_name)?;
    let artist = captures.name("artist")?.as_str().trim();
    let title = captures.name("title")?.as_str().trim();
    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some(TagSet::new(artist, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Artist - Title.mp3", "Artist", "Title")]
    #[case("Daft Punk - One More Time.flac", "Daft Punk", "One More Time")]
    #[case("AC-DC - Back In Black.MP3", "AC-DC", "Back In Black")]
    #[case("Artist - Title - Radio Edit.mp3", "Artist", "Title - Radio Edit")]
    #[case("Artist - Title.With.Dots.m4a", "Artist", "Title.With.Dots")]
    #[case("  Artist   -   Title .ogg", "Artist", "Title")]
    fn test_parse_file_name(#[case] name: &str, #[case] artist: &str, #[case] title: &str) {
        assert_eq!(parse_file_name(name), Some(TagSet::new(artist, title)));
    }

    #[rstest]
    #[case("Song.mp3")]
    #[case("Artist - Title")]
    #[case("Artist-Title.mp3")]
    #[case("Artist - .mp3")]
    #[case(" - Title.mp3")]
    #[case("")]
    fn test_parse_file_name_rejects(#[case] name: &str) {
        assert_eq!(parse_file_name(name), None);
    }

    #[test]
    fn test_tag_set_is_empty() {
        assert!(TagSet::default().is_empty());
        assert!(TagSet::new("  ", "").is_empty());
        assert!(!TagSet::new("Artist", "").is_empty());
        assert!(!TagSet::new("", "Title").is_empty());
    }
}
