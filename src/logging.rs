use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tunedrop_config::Config;

/// Crates whose logs follow `--verbose`/`--quiet`. Everything else only
/// reports warnings.
const OWN_CRATES: &[&str] =
    &["tunedrop", "tunedrop_config", "tunedrop_notifier", "tunedrop_pipeline", "tunedrop_storage", "tunedrop_tags"];

fn level(config: &Config) -> &'static str {
    if config.verbose {
        "debug"
    } else if config.quiet {
        "warn"
    } else {
        "info"
    }
}

fn default_directives(config: &Config) -> String {
    let level = level(config);
    let own = OWN_CRATES.iter().map(|c| format!("{c}={level}"));
    std::iter::once("warn".to_string()).chain(own).collect::<Vec<_>>().join(",")
}

/// Log to stderr. `RUST_LOG`, when set, replaces the verbosity flags.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
