use crate::relocate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tunedrop_config::{GuardConfig, StatFailure};
use tunedrop_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};

/// Holds relocation back until the destination directory is there.
///
/// The destination is checked afresh for every candidate. While the check
/// fails with one of the `retry_on` failures (by default, only "not found",
/// i.e. the volume isn't mounted) the guard keeps checking every `interval`.
/// Any other failure is a misconfiguration.
#[derive(Clone, Debug)]
pub struct DestinationGuard {
    destination: PathBuf,
    config: GuardConfig,
}

fn classify(err: &StorageError) -> StatFailure {
    match err.deref() {
        StorageErrorKind::NotFound(_) => StatFailure::NotFound,
        StorageErrorKind::PermissionDenied(_) => StatFailure::PermissionDenied,
        StorageErrorKind::NotADirectory(_) => StatFailure::NotADirectory,
        StorageErrorKind::InvalidPath(_) | StorageErrorKind::Changed(_) | StorageErrorKind::Io(_) => StatFailure::Other,
    }
}

impl DestinationGuard {
    pub fn new(destination: impl Into<PathBuf>, config: &GuardConfig) -> Self {
        Self { destination: destination.into(), config: config.clone() }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Wait until the destination exists and is a directory.
    ///
    /// # Errors
    /// - [`GuardMisconfigured`](ErrorKind::GuardMisconfigured) when the check
    ///   fails in a way that isn't retried.
    /// - [`GuardTimeout`](ErrorKind::GuardTimeout) when `max_wait` passes.
    /// - [`Cancelled`](ErrorKind::Cancelled) when `cancel` fires first.
    pub async fn wait_ready(&self, cancel: &CancellationToken) -> Result<()> {
        let started = Instant::now();
        let mut waiting = false;
        loop {
            let err = match tunedrop_storage::stat_dir(&self.destination).await {
                Ok(()) => {
                    if waiting {
                        tracing::info!(destination = %self.destination.display(), "Destination is available again");
                    }
                    return Ok(());
                },
                Err(e) => e,
            };
            if !self.config.retries(classify(&err)) {
                tracing::error!(destination = %self.destination.display(), error = %err, "Destination check failed");
                return Err(err).or_raise(|| ErrorKind::GuardMisconfigured);
            }
            if let Some(max_wait) = self.config.max_wait()
                && started.elapsed() >= max_wait
            {
                return Err(err).or_raise(|| ErrorKind::GuardTimeout);
            }
            if !waiting {
                tracing::warn!(destination = %self.destination.display(), error = %err, "Destination unavailable; waiting for it");
                waiting = true;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
                () = tokio::time::sleep(self.config.interval()) => {},
            }
        }
    }
}
