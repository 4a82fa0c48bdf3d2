use crate::error::{ErrorKind, Result};
use crate::models::Config;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "TUNEDROP_";
const ENV_SPLIT: &str = "__";

/// `config.toml` in the platform's configuration directory, e.g.
/// `~/.config/tunedrop/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tunedrop").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Builds a [`Config`] out of its layers.
#[derive(Debug)]
pub struct Loader {
    figment: Figment,
}

impl Loader {
    /// Start from defaults, a configuration file and the environment.
    ///
    /// An explicit `config_file` must exist. Without one, the
    /// [default location](default_config_path) is used if something is there.
    pub fn new(config_file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        match config_file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "Using default configuration file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(Self { figment: figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT)) })
    }

    /// Override a single (dot-separated) key, above every other layer.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    /// [`set`](Self::set) when there's something to set.
    pub fn set_some<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Merge every layer, then validate.
    pub fn load(self) -> Result<Config> {
        let config: Config = self.figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
