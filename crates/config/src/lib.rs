//! Configuration for tunedrop.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. `TUNEDROP_*` environment variables (`__` separates nested keys, so
//!    `TUNEDROP_SCAN__MODE=watch` sets `scan.mode`),
//! 4. explicit overrides, normally command-line flags ([`Loader::set`]).
//!
//! The merged result is validated before it is handed out.

pub mod error;
mod loader;
mod models;

pub use loader::{Loader, default_config_path};
pub use models::{
    Config, DEFAULT_PATTERN, GuardConfig, NotificationConfig, ScanConfig, ScanMode, ShutdownPolicy, StatFailure,
};
