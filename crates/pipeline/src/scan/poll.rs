use crate::scan::error::Result;
use crate::scan::{CandidateStream, Scanner};
use crate::{Candidate, Pattern};
use async_stream::stream;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Lists the source directory on a fixed interval.
///
/// The first listing happens immediately. A slow consumer delays the next
/// listing rather than causing a burst of catch-up listings.
#[derive(Clone, Debug)]
pub struct PollScanner {
    directory: PathBuf,
    pattern: Pattern,
    interval: Duration,
}

impl PollScanner {
    pub fn new(directory: impl Into<PathBuf>, pattern: Pattern, interval: Duration) -> Self {
        Self { directory: directory.into(), pattern, interval }
    }
}

impl Scanner for PollScanner {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn candidates(self) -> Result<CandidateStream> {
        let Self { directory, pattern, interval } = self;
        Ok(Box::pin(stream! {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::trace!(directory = %directory.display(), "Listing source directory");
                for await entry in tunedrop_storage::list(&directory) {
                    match entry {
                        Ok(entry) if entry.is_file() && pattern.matches_path(&entry.path) => {
                            yield Candidate::new(entry.path);
                        },
                        Ok(_) => {},
                        Err(e) => tracing::warn!(directory = %directory.display(), error = %e, "Could not list source directory"),
                    }
                }
            }
        }))
    }
}
