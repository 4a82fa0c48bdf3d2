use crate::relocate::error::{ErrorKind, Result, Stage};
use crate::relocate::file::{Outcome, Relocation, SkipReason, relocate_file};
use crate::scan::InFlight;
use crate::{Candidate, Context};
use async_stream::stream;
use futures::Stream;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tunedrop_config::ShutdownPolicy;

/// Progress events emitted by [`relocate`], one per candidate taken off the
/// queue.
#[derive(Debug)]
pub enum RelocateEvent {
    Relocated(Relocation),
    Skipped { path: PathBuf, reason: SkipReason },
    /// Shutdown was requested while this candidate waited for the
    /// destination. Its source is untouched.
    Abandoned { path: PathBuf },
    /// The candidate could not be relocated; see `error` for the stage.
    Failed { path: PathBuf, error: super::Error },
}

impl RelocateEvent {
    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        match self {
            Self::Relocated(relocation) => &relocation.source,
            Self::Skipped { path, .. } | Self::Abandoned { path } | Self::Failed { path, .. } => path,
        }
    }
}

/// Drain `queue`, relocating one candidate at a time in the order they were
/// queued.
///
/// Per-candidate failures are yielded as [`RelocateEvent::Failed`] and the
/// worker carries on. The only `Err` this stream yields is a fatal one
/// (destination misconfigured), after which it ends.
///
/// The stream ends by itself once the queue is closed and empty. Under
/// [`ShutdownPolicy::Abort`] it also ends as soon as `cancel` fires, leaving
/// anything still queued where it is.
pub fn relocate<'a>(
    ctx: &'a Context,
    mut queue: mpsc::Receiver<Candidate>,
    in_flight: InFlight,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<RelocateEvent>> + 'a {
    stream!({
        loop {
            let next = match ctx.config.shutdown {
                ShutdownPolicy::Drain => queue.recv().await,
                ShutdownPolicy::Abort => tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    next = queue.recv() => next,
                },
            };
            let Some(candidate) = next else { break };
            let waited = time::UtcDateTime::now() - candidate.discovered_at;
            tracing::debug!(path = %candidate.path.display(), %waited, "Processing candidate");

            let result = relocate_file(ctx, &candidate, &cancel).await;
            in_flight.release(&candidate.path);
            let path = candidate.path;
            match result {
                Ok(Outcome::Relocated(relocation)) => yield Ok(RelocateEvent::Relocated(relocation)),
                Ok(Outcome::Skipped(reason)) => {
                    tracing::debug!(path = %path.display(), %reason, "Skipped");
                    yield Ok(RelocateEvent::Skipped { path, reason });
                },
                Err(e) if e.is_fatal() => {
                    yield Err(e);
                    return;
                },
                Err(e) if matches!(e.deref(), ErrorKind::Cancelled) => {
                    tracing::info!(path = %path.display(), "Shutting down; leaving file in place");
                    yield Ok(RelocateEvent::Abandoned { path });
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        stage = %e.stage(),
                        retryable = e.is_retryable(),
                        error = %e,
                        "Could not relocate file"
                    );
                    yield Ok(RelocateEvent::Failed { path, error: e });
                },
            }
        }
        tracing::debug!("Relocation worker stopped");
    })
}

/// Running totals over a worker's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub relocated: u64,
    pub skipped: u64,
    pub abandoned: u64,
    pub guard_failures: u64,
    pub copy_failures: u64,
    pub delete_failures: u64,
    /// Relocations that went through but whose tags could not be backfilled.
    /// These are also counted in `relocated`.
    pub tag_failures: u64,
}

impl Summary {
    pub fn record(&mut self, event: &RelocateEvent) {
        match event {
            RelocateEvent::Relocated(relocation) => {
                self.relocated += 1;
                if relocation.tags == super::TagStep::Failed {
                    self.tag_failures += 1;
                }
            },
            RelocateEvent::Skipped { .. } => self.skipped += 1,
            RelocateEvent::Abandoned { .. } => self.abandoned += 1,
            RelocateEvent::Failed { error, .. } => match error.stage() {
                Stage::Guard => self.guard_failures += 1,
                Stage::Copy => self.copy_failures += 1,
                Stage::Delete => self.delete_failures += 1,
                Stage::Tags => self.tag_failures += 1,
            },
        }
    }

    /// Candidates that were not relocated because a step failed.
    pub fn failed(&self) -> u64 {
        self.guard_failures + self.copy_failures + self.delete_failures
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} relocated, {} skipped, {} abandoned, {} failed (guard {}, copy {}, delete {}), {} tag failures",
            self.relocated,
            self.skipped,
            self.abandoned,
            self.failed(),
            self.guard_failures,
            self.copy_failures,
            self.delete_failures,
            self.tag_failures,
        )
    }
}
