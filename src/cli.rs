use clap::Parser;
use std::path::{PathBuf, absolute};
use tunedrop_config::error::Result;
use tunedrop_config::{Config, Loader, ScanMode, ShutdownPolicy};

/// Watch a directory for new music and move it somewhere better.
///
/// Every option can also be set in the configuration file or through
/// `TUNEDROP_*` environment variables; command-line options win.
#[derive(Debug, Parser)]
#[command(name = "tunedrop", version, about)]
pub struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', value_name = "FILE", env = "TUNEDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory to watch for new music
    #[arg(long, visible_alias = "src", value_name = "DIR")]
    source: Option<PathBuf>,

    /// Directory to move music into
    #[arg(long = "dest", visible_alias = "dst", value_name = "DIR")]
    destination: Option<PathBuf>,

    /// Case-insensitive regular expression file names must match
    #[arg(long, value_name = "REGEX")]
    pattern: Option<String>,

    /// How to notice new files
    #[arg(long, value_enum)]
    mode: Option<ScanMode>,

    /// Seconds between directory listings in poll mode
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// What to do with queued files on Ctrl-C
    #[arg(long, value_enum)]
    shutdown: Option<ShutdownPolicy>,

    /// Log everything
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Don't show desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Don't fill in missing artist/title tags
    #[arg(long)]
    no_backfill: bool,
}

/// Relative paths given on the command line are relative to where the
/// command was run.
fn absolutize(path: PathBuf) -> PathBuf {
    absolute(&path).unwrap_or(path)
}

impl Args {
    /// Merge these arguments over the configuration file and environment.
    pub fn resolve(self) -> Result<Config> {
        Loader::new(self.config.as_deref())?
            .set_some("source", self.source.map(absolutize))
            .set_some("destination", self.destination.map(absolutize))
            .set_some("pattern", self.pattern)
            .set_some("scan.mode", self.mode)
            .set_some("scan.interval_secs", self.interval)
            .set_some("shutdown", self.shutdown)
            .set_some("verbose", self.verbose.then_some(true))
            .set_some("quiet", self.quiet.then_some(true))
            .set_some("notifications.enabled", self.no_notify.then_some(false))
            .set_some("backfill", self.no_backfill.then_some(false))
            .load()
    }
}
