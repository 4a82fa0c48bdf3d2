use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::relocate::{Summary, relocate};
use crate::scan::{InFlight, PollScanner, WatchScanner, feed};
use exn::ResultExt;
use futures::StreamExt;
use std::pin::pin;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tunedrop_config::ScanMode;

/// Run the pipeline until `cancel` fires or something fatal happens.
///
/// The scanner runs as its own task; the worker runs on the caller's task.
/// On cancellation the scanner stops queueing and the worker follows the
/// configured [`ShutdownPolicy`](tunedrop_config::ShutdownPolicy). Returns
/// what the worker got through.
pub async fn run(ctx: &Context, cancel: CancellationToken) -> Result<Summary> {
    let config = &ctx.config;
    if let Err(e) = tunedrop_storage::stat_dir(&config.source).await {
        // Polling tolerates this and keeps trying; watching can't start.
        tracing::warn!(source = %config.source.display(), error = %e, "Source directory is not available");
    }
    tracing::info!(
        source = %config.source.display(),
        destination = %config.destination.display(),
        pattern = ctx.pattern.as_str(),
        "Starting"
    );

    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let in_flight = InFlight::default();
    let scanner_cancel = cancel.child_token();
    let scanner = match config.scan.mode {
        ScanMode::Poll => {
            let scanner = PollScanner::new(&config.source, ctx.pattern.clone(), config.scan.interval());
            tokio::spawn(feed(scanner, sender, in_flight.clone(), scanner_cancel.clone()))
        },
        ScanMode::Watch => {
            let scanner = WatchScanner::new(&config.source, ctx.pattern.clone(), config.scan.initial_sweep);
            tokio::spawn(feed(scanner, sender, in_flight.clone(), scanner_cancel.clone()))
        },
    };

    let mut summary = Summary::default();
    let mut fatal = None;
    {
        let mut events = pin!(relocate(ctx, receiver, in_flight, cancel));
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => summary.record(&event),
                Err(e) => {
                    fatal = Some(e);
                    break;
                },
            }
        }
    }
    // The worker is done (and its end of the queue is gone); the scanner
    // must not outlive it.
    scanner_cancel.cancel();
    let scanned = scanner.await;
    tracing::info!(%summary, "Stopped");

    if let Some(e) = fatal {
        return Err(e).or_raise(|| ErrorKind::Relocate);
    }
    match scanned {
        Ok(result) => result.or_raise(|| ErrorKind::Scan)?,
        Err(e) => return Err(e).or_raise(|| ErrorKind::Scan),
    }
    Ok(summary)
}
