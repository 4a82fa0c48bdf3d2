use crate::scan::error::{ErrorKind, Result};
use crate::scan::{CandidateStream, Scanner};
use crate::{Candidate, Pattern};
use async_stream::stream;
use exn::ResultExt;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Capacity of the channel bridging `notify`'s callback thread into Tokio.
/// The callback blocks when it is full, so nothing is dropped.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Reacts to files appearing in the source directory.
///
/// Only events that make a name appear count: creation, and renames into the
/// directory. Modifications, removals and access events are ignored.
/// Candidate paths are reported under the directory's resolved path.
#[derive(Clone, Debug)]
pub struct WatchScanner {
    directory: PathBuf,
    pattern: Pattern,
    initial_sweep: bool,
}

impl WatchScanner {
    pub fn new(directory: impl Into<PathBuf>, pattern: Pattern, initial_sweep: bool) -> Self {
        Self { directory: directory.into(), pattern, initial_sweep }
    }
}

/// The paths an event makes appear, if any.
fn appeared(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => vec![],
        EventKind::Create(_) => event.paths,
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => event.paths,
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.into_iter().skip(1).collect(),
        _ => vec![],
    }
}

fn in_directory(directory: &Path, path: &Path) -> bool {
    path.parent() == Some(directory)
}

impl Scanner for WatchScanner {
    fn name(&self) -> &'static str {
        "watch"
    }

    fn candidates(self) -> Result<CandidateStream> {
        let Self { directory, pattern, initial_sweep } = self;
        // Some backends report events against the resolved path, so a source
        // reached through a symlink has to be compared in its resolved form.
        let directory = std::fs::canonicalize(&directory).or_raise(|| ErrorKind::Watch(directory.clone()))?;
        let (sender, mut receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut watcher = RecommendedWatcher::new(
            move |event: notify::Result<Event>| {
                // Runs on notify's own thread. A send error means the stream
                // was dropped; there's nobody left to tell.
                _ = sender.blocking_send(event);
            },
            notify::Config::default(),
        )
        .or_raise(|| ErrorKind::Watch(directory.clone()))?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .or_raise(|| ErrorKind::Watch(directory.clone()))?;
        tracing::debug!(directory = %directory.display(), "Watching for new files");

        Ok(Box::pin(stream! {
            // Dropping the watcher stops event delivery; it lives as long as
            // the stream does.
            let _watcher = watcher;
            if initial_sweep {
                for await entry in tunedrop_storage::list(&directory) {
                    match entry {
                        Ok(entry) if entry.is_file() && pattern.matches_path(&entry.path) => {
                            yield Candidate::new(entry.path);
                        },
                        Ok(_) => {},
                        Err(e) => tracing::warn!(directory = %directory.display(), error = %e, "Initial sweep failed"),
                    }
                }
            }
            while let Some(event) = receiver.recv().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(directory = %directory.display(), error = %e, "Filesystem watch error");
                        continue;
                    },
                };
                for path in appeared(event) {
                    if in_directory(&directory, &path) && pattern.matches_path(&path) {
                        yield Candidate::new(path);
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use notify::event::{AccessKind, DataChange, RemoveKind};
    use rstest::rstest;
    use std::fs;
    use std::time::Duration;
    use tunedrop_config::DEFAULT_PATTERN;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths.iter().fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[rstest]
    #[case(EventKind::Create(CreateKind::File), &["/in/a.mp3"], &["/in/a.mp3"])]
    #[case(EventKind::Create(CreateKind::Any), &["/in/a.mp3"], &["/in/a.mp3"])]
    #[case(EventKind::Create(CreateKind::Folder), &["/in/Album"], &[])]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/in/a.mp3"], &["/in/a.mp3"])]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/in/a.part", "/in/a.mp3"], &["/in/a.mp3"])]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/in/a.mp3"], &[])]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/in/a.mp3"], &[])]
    #[case(EventKind::Remove(RemoveKind::File), &["/in/a.mp3"], &[])]
    #[case(EventKind::Access(AccessKind::Read), &["/in/a.mp3"], &[])]
    fn test_appeared(#[case] kind: EventKind, #[case] paths: &[&str], #[case] expected: &[&str]) {
        let expected: Vec<PathBuf> = expected.iter().map(|p| PathBuf::from(*p)).collect();
        assert_eq!(appeared(event(kind, paths)), expected);
    }

    #[test]
    fn test_in_directory() {
        assert!(in_directory(Path::new("/in"), Path::new("/in/a.mp3")));
        assert!(!in_directory(Path::new("/in"), Path::new("/in/Album/a.mp3")));
    }

    #[tokio::test]
    async fn test_missing_directory_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = WatchScanner::new(dir.path().join("gone"), Pattern::new(DEFAULT_PATTERN).unwrap(), true);
        assert!(scanner.candidates().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_initial_sweep_then_events() {
        let dir = tempfile::tempdir().unwrap();
        // Candidates come back under the resolved directory (e.g.
        // /private/var on macOS).
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("Existing.mp3"), b"data").unwrap();
        fs::write(root.join("notes.txt"), b"data").unwrap();

        let scanner = WatchScanner::new(&root, Pattern::new(DEFAULT_PATTERN).unwrap(), true);
        let mut candidates = scanner.candidates().unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), candidates.next()).await.unwrap().unwrap();
        assert_eq!(first.path, root.join("Existing.mp3"));

        fs::write(root.join("ignored.txt"), b"data").unwrap();
        fs::write(root.join("New.mp3"), b"data").unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), candidates.next()).await.unwrap().unwrap();
        assert_eq!(next.path, root.join("New.mp3"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn test_source_behind_a_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let real = root.join("Downloads");
        fs::create_dir(&real).unwrap();
        let link = root.join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        fs::write(real.join("Existing.mp3"), b"data").unwrap();

        let scanner = WatchScanner::new(&link, Pattern::new(DEFAULT_PATTERN).unwrap(), true);
        let mut candidates = scanner.candidates().unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), candidates.next()).await.unwrap().unwrap();
        assert_eq!(first.path, real.join("Existing.mp3"));

        fs::write(link.join("New.mp3"), b"data").unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), candidates.next()).await.unwrap().unwrap();
        assert_eq!(next.path, real.join("New.mp3"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_without_initial_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("Existing.mp3"), b"data").unwrap();

        let scanner = WatchScanner::new(&root, Pattern::new(DEFAULT_PATTERN).unwrap(), false);
        let mut candidates = scanner.candidates().unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(200), candidates.next()).await;
        assert!(pending.is_err(), "existing files are not reported without a sweep");
    }
}
