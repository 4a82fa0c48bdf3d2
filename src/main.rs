//! tunedrop
//!
//! Watches a directory for new music and moves it somewhere better.
//!
//! Usage:
//!     tunedrop --source ~/Downloads --dest /Volumes/Music/Inbox

mod cli;
mod logging;
mod signal;

use crate::cli::Args;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tunedrop_notifier::{NoopNotifier, NotifierHandle};
use tunedrop_pipeline::{Context, run};

/// Exit status for configuration problems, as opposed to runtime failures.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tunedrop: {e:?}");
            return ExitCode::from(EXIT_CONFIG);
        },
    };
    logging::init(&config);

    let notifier: NotifierHandle =
        if config.notifications.enabled { tunedrop_notifier::detect() } else { Arc::new(NoopNotifier) };
    let ctx = match Context::new(config, notifier) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("tunedrop: {e:?}");
            return ExitCode::from(EXIT_CONFIG);
        },
    };

    let cancel = CancellationToken::new();
    tokio::spawn(signal::cancel_on_shutdown(cancel.clone()));
    match run(&ctx, cancel).await {
        Ok(summary) => {
            tracing::info!(%summary, "Shut down cleanly");
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = %e, "Stopped after a fatal error");
            eprintln!("tunedrop: {e:?}");
            ExitCode::FAILURE
        },
    }
}
