use std::future::pending;
use tokio_util::sync::CancellationToken;

/// Exit status after a second interrupt, following the shell convention for
/// SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C");
        pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not listen for SIGTERM");
            pending::<()>().await;
        },
    }
}

#[cfg(not(unix))]
async fn terminate() {
    pending::<()>().await;
}

/// Cancel `cancel` on Ctrl-C or SIGTERM. A second Ctrl-C exits immediately
/// rather than waiting for queued files to finish.
pub async fn cancel_on_shutdown(cancel: CancellationToken) {
    tokio::select! {
        () = interrupt() => {},
        () = terminate() => {},
    }
    tracing::info!("Shutdown requested; finishing up (press Ctrl-C again to exit now)");
    cancel.cancel();

    interrupt().await;
    tracing::warn!("Exiting without finishing queued files");
    std::process::exit(EXIT_INTERRUPTED);
}
