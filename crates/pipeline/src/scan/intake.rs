use crate::Candidate;
use crate::scan::Scanner;
use crate::scan::error::Result;
use futures::StreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Paths that are queued or being relocated right now.
///
/// The scanner claims a path before queueing it and the worker releases it
/// once it is done, whatever the outcome. A path that is still claimed is not
/// queued again.
#[derive(Clone, Debug, Default)]
pub struct InFlight(Arc<Mutex<HashSet<PathBuf>>>);

impl InFlight {
    /// Returns `false` if `path` was already claimed.
    pub fn claim(&self, path: &Path) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).insert(path.to_path_buf())
    }

    pub fn release(&self, path: &Path) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).remove(path);
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).contains(path)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `scanner`, pushing everything it finds into `queue`.
///
/// Waits for room whenever the queue is full. Returns when `cancel` fires,
/// when the worker hangs up, or (never, in practice) when the scanner runs
/// dry. The sender is dropped on return, which is how the worker learns that
/// no more candidates are coming.
pub async fn feed<S: Scanner>(
    scanner: S,
    queue: mpsc::Sender<Candidate>,
    in_flight: InFlight,
    cancel: CancellationToken,
) -> Result<()> {
    let name = scanner.name();
    let mut candidates = scanner.candidates()?;
    tracing::info!(scanner = name, "Scanning for new files");
    loop {
        let candidate = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = candidates.next() => match next {
                Some(candidate) => candidate,
                None => break,
            },
        };
        if !in_flight.claim(&candidate.path) {
            tracing::trace!(path = %candidate.path.display(), "Already queued; ignoring");
            continue;
        }
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                in_flight.release(&candidate.path);
                break;
            },
            permit = queue.reserve() => match permit {
                Ok(permit) => permit,
                Err(_closed) => {
                    in_flight.release(&candidate.path);
                    break;
                },
            },
        };
        tracing::info!(path = %candidate.path.display(), "Found file");
        permit.send(candidate);
    }
    tracing::debug!(scanner = name, "Scanner stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pattern;
    use crate::scan::{CandidateStream, PollScanner};
    use std::fs;
    use std::time::Duration;
    use tunedrop_config::DEFAULT_PATTERN;

    /// Hands out a fixed list of candidates, then waits forever.
    struct FixedScanner(Vec<&'static str>);
    impl Scanner for FixedScanner {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn candidates(self) -> Result<CandidateStream> {
            let candidates = self.0.into_iter().map(Candidate::new);
            Ok(Box::pin(futures::stream::iter(candidates).chain(futures::stream::pending())))
        }
    }

    #[test]
    fn test_in_flight() {
        let in_flight = InFlight::default();
        assert!(in_flight.claim(Path::new("/a.mp3")));
        assert!(!in_flight.claim(Path::new("/a.mp3")));
        assert!(in_flight.contains(Path::new("/a.mp3")));
        in_flight.release(Path::new("/a.mp3"));
        assert!(in_flight.is_empty());
        assert!(in_flight.claim(Path::new("/a.mp3")));
    }

    #[tokio::test]
    async fn test_duplicates_are_dropped_while_in_flight() {
        let (sender, mut receiver) = mpsc::channel(10);
        let in_flight = InFlight::default();
        let cancel = CancellationToken::new();
        let scanner = FixedScanner(vec!["/in/a.mp3", "/in/b.mp3", "/in/a.mp3"]);
        let task = tokio::spawn(feed(scanner, sender, in_flight.clone(), cancel.clone()));

        let paths: Vec<PathBuf> = [receiver.recv().await.unwrap(), receiver.recv().await.unwrap()]
            .into_iter()
            .map(|c| c.path)
            .collect();
        assert_eq!(paths, [PathBuf::from("/in/a.mp3"), PathBuf::from("/in/b.mp3")]);
        assert!(tokio::time::timeout(Duration::from_millis(50), receiver.recv()).await.is_err());
        assert_eq!(in_flight.len(), 2);

        cancel.cancel();
        task.await.unwrap().unwrap();
        // The sender went away with the scanner.
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_backpressure_loses_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("Track {i:02}.mp3")).collect();
        for name in &names {
            fs::write(dir.path().join(name), b"data").unwrap();
        }
        let scanner = PollScanner::new(dir.path(), Pattern::new(DEFAULT_PATTERN).unwrap(), Duration::from_millis(10));
        let (sender, mut receiver) = mpsc::channel(2);
        let in_flight = InFlight::default();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(feed(scanner, sender, in_flight.clone(), cancel.clone()));

        let mut received = Vec::new();
        while received.len() < names.len() {
            let candidate = tokio::time::timeout(Duration::from_secs(5), receiver.recv()).await.unwrap().unwrap();
            // A slow consumer: the scanner has to wait for room.
            tokio::time::sleep(Duration::from_millis(5)).await;
            received.push(candidate.path.file_name().unwrap().to_string_lossy().into_owned());
        }
        received.sort();
        assert_eq!(received, names);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cancel_while_queue_full_releases_claim() {
        let (sender, mut receiver) = mpsc::channel(1);
        let in_flight = InFlight::default();
        let cancel = CancellationToken::new();
        let scanner = FixedScanner(vec!["/in/a.mp3", "/in/b.mp3"]);
        let task = tokio::spawn(feed(scanner, sender, in_flight.clone(), cancel.clone()));

        // a.mp3 fills the queue; b.mp3 is claimed while waiting for room.
        let mut attempts = 0;
        while in_flight.len() < 2 {
            attempts += 1;
            assert!(attempts < 500, "scanner never blocked on the full queue");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        task.await.unwrap().unwrap();

        assert!(in_flight.contains(Path::new("/in/a.mp3")));
        assert!(!in_flight.contains(Path::new("/in/b.mp3")));
        assert_eq!(receiver.recv().await.unwrap().path, PathBuf::from("/in/a.mp3"));
        assert!(receiver.recv().await.is_none());
    }
}
