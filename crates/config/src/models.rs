use crate::error::{ErrorKind, Problem, Problems, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Common audio container extensions, matched case-insensitively against the
/// file name.
pub const DEFAULT_PATTERN: &str = r"\.(mp3|flac|m4a|aac|ogg|oga|opus|wav|aiff?|wma)$";

/// How the source directory is observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// List the directory every `scan.interval_secs`.
    #[default]
    Poll,
    /// Subscribe to filesystem events, after an optional initial sweep.
    Watch,
}

/// What happens to queued work when a shutdown is requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Stop discovering, finish everything already queued.
    #[default]
    Drain,
    /// Stop after the candidate currently being relocated.
    Abort,
}

/// Classification of a failed destination check, used to decide whether the
/// guard keeps waiting or gives up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatFailure {
    /// The destination does not exist (typically: the volume is unmounted).
    NotFound,
    PermissionDenied,
    /// The destination exists but is not a directory.
    NotADirectory,
    /// Anything else.
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Seconds between polls. Ignored in watch mode.
    pub interval_secs: u64,
    /// In watch mode, enqueue whatever is already sitting in the source
    /// directory at startup.
    pub initial_sweep: bool,
}
impl Default for ScanConfig {
    fn default() -> Self {
        Self { mode: ScanMode::default(), interval_secs: 30, initial_sweep: true }
    }
}
impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Milliseconds between destination checks while waiting.
    pub interval_ms: u64,
    /// Give up on a candidate after this long. `None` waits forever.
    pub max_wait_secs: Option<u64>,
    /// Failures that mean "wait and check again". Any other failure is
    /// treated as a misconfiguration and stops the service.
    pub retry_on: Vec<StatFailure>,
}
impl Default for GuardConfig {
    fn default() -> Self {
        Self { interval_ms: 5000, max_wait_secs: None, retry_on: vec![StatFailure::NotFound] }
    }
}
impl GuardConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub fn retries(&self, failure: StatFailure) -> bool {
        self.retry_on.contains(&failure)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub title: String,
}
impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true, title: "tunedrop".to_string() }
    }
}

/// Fully merged service configuration.
///
/// `source` and `destination` have no sensible default; they are empty until
/// a configuration layer sets them, and [`Config::validate`] rejects them
/// while they are.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory watched for new audio files.
    pub source: PathBuf,
    /// Directory audio files are relocated into.
    pub destination: PathBuf,
    /// Regular expression matched against file names (case-insensitive).
    pub pattern: String,
    pub verbose: bool,
    pub quiet: bool,
    /// Maximum number of candidates waiting to be relocated. Discovery
    /// blocks while the queue is full.
    pub queue_capacity: usize,
    pub scan: ScanConfig,
    pub guard: GuardConfig,
    /// How long, in milliseconds, a file has to go without being modified
    /// before it is copied. Files still being written wait; `0` copies
    /// straight away (a copy that races a writer is still caught and
    /// retried).
    pub settle_ms: u64,
    /// Write artist/title tags derived from `Artist - Title.ext` names.
    pub backfill: bool,
    pub notifications: NotificationConfig,
    pub shutdown: ShutdownPolicy,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            pattern: DEFAULT_PATTERN.to_string(),
            verbose: false,
            quiet: false,
            queue_capacity: 5,
            scan: ScanConfig::default(),
            guard: GuardConfig::default(),
            settle_ms: 2000,
            backfill: true,
            notifications: NotificationConfig::default(),
            shutdown: ShutdownPolicy::default(),
        }
    }
}

impl Config {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Check the merged configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let mut directory = |field: &'static str, path: &PathBuf| {
            if path.as_os_str().is_empty() {
                problems.push(Problem::new(field, "is required"));
            } else if !path.is_absolute() {
                problems.push(Problem::new(field, format!("must be an absolute path, got {}", path.display())));
            }
        };
        directory("source", &self.source);
        directory("destination", &self.destination);
        if !self.source.as_os_str().is_empty() && self.source == self.destination {
            problems.push(Problem::new("destination", "must differ from source"));
        }
        if let Err(e) = RegexBuilder::new(&self.pattern).case_insensitive(true).build() {
            problems.push(Problem::new("pattern", e.to_string()));
        }
        if self.verbose && self.quiet {
            problems.push(Problem::new("quiet", "cannot be combined with verbose"));
        }
        if self.queue_capacity == 0 {
            problems.push(Problem::new("queue_capacity", "must be at least 1"));
        }
        if self.scan.interval_secs == 0 {
            problems.push(Problem::new("scan.interval_secs", "must be at least 1"));
        }
        if self.guard.interval_ms == 0 {
            problems.push(Problem::new("guard.interval_ms", "must be at least 1"));
        }
        if self.guard.max_wait_secs == Some(0) {
            problems.push(Problem::new("guard.max_wait_secs", "must be at least 1 when set"));
        }
        if !problems.is_empty() {
            exn::bail!(ErrorKind::Invalid(Problems(problems)));
        }
        Ok(())
    }
}
