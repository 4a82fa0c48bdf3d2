use crate::relocate::error::{ErrorKind, Result};
use crate::{Candidate, Context};
use exn::ResultExt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tunedrop_notifier::Notification;
use tunedrop_storage::Entry;
use tunedrop_storage::error::ErrorKind as StorageErrorKind;
use tunedrop_tags::Backfill;

/// A candidate that was moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
    pub tags: TagStep,
}

/// What happened to the relocated file's tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagStep {
    /// Backfill is turned off.
    Disabled,
    Done(Backfill),
    /// Reading or writing tags failed; the error has been logged and the
    /// relocation stands.
    Failed,
}

/// Why a candidate was left alone. None of these are errors.
#[derive(Clone, Copy, Debug, derive_more::Display, PartialEq, Eq)]
pub enum SkipReason {
    /// The file was gone by the time the worker got to it.
    #[display("vanished")]
    Vanished,
    /// The path is (now) a directory or some other non-regular file.
    #[display("not a regular file")]
    NotAFile,
    #[display("does not match the pattern")]
    NoLongerMatches,
    /// The path has no usable base name.
    #[display("invalid file name")]
    InvalidName,
}

/// The outcome of (successfully) processing a single candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Relocated(Relocation),
    Skipped(SkipReason),
}

/// What the source path holds right now.
enum Source {
    File(Entry),
    Skip(SkipReason),
}

async fn inspect(path: &Path) -> Result<Source> {
    match tunedrop_storage::stat(path).await {
        Ok(entry) if entry.is_file() => Ok(Source::File(entry)),
        Ok(_) => Ok(Source::Skip(SkipReason::NotAFile)),
        Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => Ok(Source::Skip(SkipReason::Vanished)),
        Err(e) => Err(e).or_raise(|| ErrorKind::Copy),
    }
}

/// Wait until the file at `path` has gone `quiet` without being modified.
async fn settle(path: &Path, quiet: Duration, cancel: &CancellationToken) -> Result<Source> {
    loop {
        let entry = match inspect(path).await? {
            Source::File(entry) => entry,
            skip @ Source::Skip(_) => return Ok(skip),
        };
        // A missing or future mtime can't be waited out.
        let idle = entry.modified.and_then(|m| SystemTime::now().duration_since(m).ok()).unwrap_or(quiet);
        let Some(remaining) = quiet.checked_sub(idle).filter(|r| !r.is_zero()) else {
            return Ok(Source::File(entry));
        };
        tracing::debug!(path = %path.display(), ?remaining, "Waiting for the file to settle");
        tokio::select! {
            biased;
            () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
            () = tokio::time::sleep(remaining) => {},
        }
    }
}

/// The source still looks the way it did when the copy started.
fn unchanged(settled: &Entry, now: &Entry, bytes: u64) -> bool {
    bytes == settled.size && now.size == settled.size && now.modified == settled.modified
}

/// Relocate one candidate: re-check it, wait for it to settle and for the
/// destination, copy, verify, delete the original, backfill tags and notify.
///
/// The source is only deleted once the copy is known to hold all of it. A
/// source that changes while it is being copied has its copy discarded and
/// is waited on again.
///
/// Tag and notification problems never fail the relocation. Everything else
/// stops at the failing step and is returned with that step's
/// [`Stage`](super::Stage).
#[instrument(level = "debug", skip_all, fields(path = %candidate.path.display()))]
pub async fn relocate_file(ctx: &Context, candidate: &Candidate, cancel: &CancellationToken) -> Result<Outcome> {
    let source = candidate.path();
    let Some(name) = candidate.file_name().and_then(|n| tunedrop_storage::validate_file_name(n).ok()) else {
        return Ok(Outcome::Skipped(SkipReason::InvalidName));
    };
    if let Source::Skip(reason) = inspect(source).await? {
        return Ok(Outcome::Skipped(reason));
    }
    if !ctx.pattern.matches(name) {
        return Ok(Outcome::Skipped(SkipReason::NoLongerMatches));
    }

    let destination = ctx.guard.destination().join(name);
    let bytes = loop {
        let settled = match settle(source, ctx.config.settle(), cancel).await? {
            Source::File(entry) => entry,
            Source::Skip(reason) => return Ok(Outcome::Skipped(reason)),
        };
        ctx.guard.wait_ready(cancel).await?;

        match tunedrop_storage::transfer(source.to_path_buf(), destination.clone()).await {
            Ok(bytes) => {
                let now = tunedrop_storage::stat(source).await.ok();
                if now.is_some_and(|now| unchanged(&settled, &now, bytes)) {
                    break bytes;
                }
                tunedrop_storage::remove(&destination).await.or_raise(|| ErrorKind::Copy)?;
            },
            Err(e) if matches!(e.deref(), StorageErrorKind::Changed(_)) => {},
            Err(e) => return Err(e).or_raise(|| ErrorKind::Copy),
        }
        tracing::info!(path = %source.display(), "File changed while it was being copied; waiting for it to settle");
    };
    tunedrop_storage::remove(source).await.or_raise(|| ErrorKind::Delete)?;
    tracing::info!(source = %source.display(), destination = %destination.display(), bytes, "Moved file");

    let name = name.to_string_lossy().into_owned();
    let tags = if ctx.config.backfill { backfill(destination.clone(), name.clone()).await } else { TagStep::Disabled };

    let notification = Notification::new(
        ctx.config.notifications.title.clone(),
        format!("Found and moved {name}"),
        format!("file://{}", destination.display()),
    );
    ctx.notifier.notify(&notification).await;

    Ok(Outcome::Relocated(Relocation { source: source.to_path_buf(), destination, bytes, tags }))
}

async fn backfill(destination: PathBuf, name: String) -> TagStep {
    let path = destination.clone();
    let result = match tokio::task::spawn_blocking(move || tunedrop_tags::backfill(&path, &name)).await {
        Ok(result) => result.or_raise(|| ErrorKind::Tags),
        Err(e) => Err(e).or_raise(|| ErrorKind::Tags),
    };
    match result {
        Ok(backfill) => TagStep::Done(backfill),
        Err(e) => {
            tracing::warn!(path = %destination.display(), stage = %e.stage(), error = %e, "Could not backfill tags");
            TagStep::Failed
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tunedrop_config::Config;
    use tunedrop_notifier::RecordingNotifier;
    use tunedrop_tags::TagSet;
    use tunedrop_tags::fixture::silent_wav;

    struct Fixture {
        source: TempDir,
        destination: TempDir,
        notifier: Arc<RecordingNotifier>,
        ctx: Context,
    }

    fn fixture(configure: impl FnOnce(&mut Config)) -> Fixture {
        let source = tempfile::tempdir().unwrap();
        let destination = tempfile::tempdir().unwrap();
        let mut config = Config {
            source: source.path().to_path_buf(),
            destination: destination.path().to_path_buf(),
            ..Config::default()
        };
        config.guard.interval_ms = 10;
        config.settle_ms = 0;
        configure(&mut config);
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = Context::new(config, notifier.clone()).unwrap();
        Fixture { source, destination, notifier, ctx }
    }

    async fn relocate(f: &Fixture, path: &Path) -> Result<Outcome> {
        relocate_file(&f.ctx, &Candidate::new(path), &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn test_relocates_and_notifies() {
        let f = fixture(|_| {});
        let source = f.source.path().join("Song.mp3");
        fs::write(&source, b"not really audio").unwrap();

        let Outcome::Relocated(relocation) = relocate(&f, &source).await.unwrap() else { panic!("not relocated") };
        let destination = f.destination.path().join("Song.mp3");
        assert_eq!(relocation.destination, destination);
        assert_eq!(relocation.bytes, 16);
        assert_eq!(fs::read(&destination).unwrap(), b"not really audio");
        assert!(!source.exists());
        // Not audio and not "Artist - Title": tag reading fails, relocation stands.
        assert_eq!(relocation.tags, TagStep::Failed);

        let received = f.notifier.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].title, "tunedrop");
        assert_eq!(received[0].body, "Found and moved Song.mp3");
        assert_eq!(received[0].link, format!("file://{}", destination.display()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_waits_for_a_growing_file_to_settle() {
        let f = fixture(|c| c.settle_ms = 300);
        let source = f.source.path().join("Song.mp3");
        fs::write(&source, [1u8; 100]).unwrap();
        let writer = {
            let source = source.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                let mut file = fs::OpenOptions::new().append(true).open(&source).unwrap();
                file.write_all(&[2u8; 100]).unwrap();
            })
        };

        let Outcome::Relocated(relocation) = relocate(&f, &source).await.unwrap() else { panic!("not relocated") };
        writer.await.unwrap();
        assert_eq!(relocation.bytes, 200);
        let copied = fs::read(f.destination.path().join("Song.mp3")).unwrap();
        assert_eq!(copied.len(), 200);
        assert_eq!(&copied[100..], [2u8; 100]);
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_cancelled_while_settling() {
        let f = fixture(|c| c.settle_ms = 60_000);
        let source = f.source.path().join("Song.mp3");
        fs::write(&source, b"data").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = relocate_file(&f.ctx, &Candidate::new(&source), &cancel).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Cancelled));
        assert!(source.exists());
        assert_eq!(fs::read_dir(f.destination.path()).unwrap().count(), 0);
    }

    fn entry(size: u64, modified_secs: u64) -> Entry {
        Entry {
            path: PathBuf::from("/in/Song.mp3"),
            kind: tunedrop_storage::EntryKind::File,
            size,
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs)),
        }
    }

    #[rstest]
    #[case::untouched(entry(10, 5), 10, true)]
    #[case::appended_after_copy(entry(20, 6), 10, false)]
    #[case::rewritten_same_size(entry(10, 6), 10, false)]
    #[case::short_copy(entry(10, 5), 4, false)]
    fn test_unchanged(#[case] now: Entry, #[case] bytes: u64, #[case] expected: bool) {
        assert_eq!(unchanged(&entry(10, 5), &now, bytes), expected);
    }

    #[tokio::test]
    async fn test_backfills_tags() {
        let f = fixture(|_| {});
        let source = f.source.path().join("Artist - Title.wav");
        fs::write(&source, silent_wav()).unwrap();

        let Outcome::Relocated(relocation) = relocate(&f, &source).await.unwrap() else { panic!("not relocated") };
        assert_eq!(relocation.tags, TagStep::Done(Backfill::Written(TagSet::new("Artist", "Title"))));
        let tags = tunedrop_tags::read_tags(&f.destination.path().join("Artist - Title.wav")).unwrap();
        assert_eq!(tags, TagSet::new("Artist", "Title"));
    }

    #[tokio::test]
    async fn test_backfill_disabled() {
        let f = fixture(|c| c.backfill = false);
        let source = f.source.path().join("Artist - Title.wav");
        fs::write(&source, silent_wav()).unwrap();

        let Outcome::Relocated(relocation) = relocate(&f, &source).await.unwrap() else { panic!("not relocated") };
        assert_eq!(relocation.tags, TagStep::Disabled);
        let tags = tunedrop_tags::read_tags(&f.destination.path().join("Artist - Title.wav")).unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_skips() {
        let f = fixture(|_| {});
        let vanished = f.source.path().join("Gone.mp3");
        assert_eq!(relocate(&f, &vanished).await.unwrap(), Outcome::Skipped(SkipReason::Vanished));

        let directory = f.source.path().join("Album.mp3");
        fs::create_dir(&directory).unwrap();
        assert_eq!(relocate(&f, &directory).await.unwrap(), Outcome::Skipped(SkipReason::NotAFile));

        let text = f.source.path().join("notes.txt");
        fs::write(&text, b"data").unwrap();
        assert_eq!(relocate(&f, &text).await.unwrap(), Outcome::Skipped(SkipReason::NoLongerMatches));
        assert!(text.exists());

        assert_eq!(relocate(&f, Path::new("/")).await.unwrap(), Outcome::Skipped(SkipReason::InvalidName));
        assert!(f.notifier.received().is_empty());
    }

    #[tokio::test]
    async fn test_copy_failure_keeps_source() {
        let f = fixture(|_| {});
        let source = f.source.path().join("Song.mp3");
        fs::write(&source, b"data").unwrap();
        // A directory squatting on the destination name: the copy can't be
        // renamed into place.
        let blocker = f.destination.path().join("Song.mp3");
        fs::create_dir(&blocker).unwrap();

        let err = relocate(&f, &source).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Copy));
        assert_eq!(fs::read(&source).unwrap(), b"data");
        assert!(blocker.is_dir());
        assert_eq!(fs::read_dir(f.destination.path()).unwrap().count(), 1);
        assert!(f.notifier.received().is_empty());
    }
}
