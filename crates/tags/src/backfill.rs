use crate::error::{ErrorKind, Result};
use crate::name::{TagSet, parse_file_name};
use exn::{OptionExt, ResultExt};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use lofty::tag::Tag;
use std::path::Path;
use tracing::instrument;

/// What [`backfill`] did to a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backfill {
    /// Both tags were empty; these values were derived from the file name
    /// and written to the file.
    Written(TagSet),
    /// At least one of artist/title already had a value; nothing was touched.
    AlreadyTagged(TagSet),
    /// Both tags were empty, but the file name isn't `Artist - Title.ext`.
    Unparseable,
}

/// Primary tag first, then whatever other containers the file carries.
fn first_non_empty<F>(tagged_file: &TaggedFile, mut extractor: F) -> String
where
    F: FnMut(&Tag) -> Option<String>,
{
    tagged_file
        .primary_tag()
        .into_iter()
        .chain(tagged_file.tags())
        .filter_map(|tag| extractor(tag))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn tag_set_of(tagged_file: &TaggedFile) -> TagSet {
    TagSet {
        artist: first_non_empty(tagged_file, |tag| tag.artist().map(|v| v.to_string())),
        title: first_non_empty(tagged_file, |tag| tag.title().map(|v| v.to_string())),
    }
}

/// Read the artist and title currently embedded in `path`.
pub fn read_tags(path: &Path) -> Result<TagSet> {
    let tagged_file = read_from_path(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    Ok(tag_set_of(&tagged_file))
}

/// Fill in artist and title from `file_name` when the file at `path` has
/// neither.
///
/// `file_name` is passed separately because the file may have been renamed
/// on its way to `path`; the name it arrived with is the one that counts.
/// If either tag already holds a value the file is left exactly as it was.
///
/// This is blocking I/O.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), file_name = %file_name))]
pub fn backfill(path: &Path, file_name: &str) -> Result<Backfill> {
    let mut tagged_file = read_from_path(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let existing = tag_set_of(&tagged_file);
    if !existing.is_empty() {
        tracing::debug!(artist = %existing.artist, title = %existing.title, "Tags already present; leaving them alone");
        return Ok(Backfill::AlreadyTagged(existing));
    }
    let Some(derived) = parse_file_name(file_name) else {
        tracing::debug!("File name does not look like \"Artist - Title.ext\"; skipping backfill");
        return Ok(Backfill::Unparseable);
    };

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file.tag_mut(tag_type).ok_or_raise(|| ErrorKind::Unsupported(path.to_path_buf()))?;
    tag.set_artist(derived.artist.clone());
    tag.set_title(derived.title.clone());
    tagged_file.save_to_path(path, WriteOptions::default()).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;

    tracing::info!(artist = %derived.artist, title = %derived.title, "Backfilled tags from file name");
    Ok(Backfill::Written(derived))
}
