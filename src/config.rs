//! Startup configuration. Precedence: CLI flags > environment > config files > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_URI: &str = "mem://";
pub const DEFAULT_DATABASE: &str = "NoName";
pub const DEFAULT_COLLECTION: &str = "mycollection";
pub const CONFIG_FILE_NAME: &str = "kartoteka.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// One source of settings; unset fields defer to lower-precedence sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub uri: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
}

impl ConfigLayer {
    /// Fill the fields still unset from `lower`.
    pub fn fill_from(&mut self, lower: Self) {
        self.uri = self.uri.take().or(lower.uri);
        self.database = self.database.take().or(lower.database);
        self.collection = self.collection.take().or(lower.collection);
        self.log_dir = self.log_dir.take().or(lower.log_dir);
        self.log_level = self.log_level.take().or(lower.log_level);
        self.log_retention = self.log_retention.or(lower.log_retention);
    }

    /// Settings from `KARTOTEKA_*` variables, read through `env`.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            uri: env("KARTOTEKA_URI"),
            database: env("KARTOTEKA_DB"),
            collection: env("KARTOTEKA_COLLECTION"),
            log_dir: env("KARTOTEKA_LOG_DIR").map(PathBuf::from),
            log_level: env("KARTOTEKA_LOG_LEVEL"),
            log_retention: env("KARTOTEKA_LOG_RETENTION").and_then(|s| s.trim().parse().ok()),
        }
    }

    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for this layout.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from(ConfigLayer::default())
    }
}

impl From<ConfigLayer> for AppConfig {
    fn from(layer: ConfigLayer) -> Self {
        Self {
            uri: layer.uri.unwrap_or_else(|| DEFAULT_URI.to_string()),
            database: layer.database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            collection: layer.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            log_dir: layer.log_dir,
            log_level: layer.log_level,
            log_retention: layer.log_retention,
        }
    }
}

/// Candidate config files, highest precedence first.
pub fn config_paths(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Some(p) = env("KARTOTEKA_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(CONFIG_FILE_NAME));
    }
    paths
}

impl AppConfig {
    /// Merge `cli` over the environment (read through `env`) over config files over defaults.
    ///
    /// # Errors
    /// An explicit `config_file` that does not exist, or any existing file that fails to parse.
    pub fn resolve(
        cli: ConfigLayer,
        config_file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(p) = config_file
            && !p.exists()
        {
            return Err(ConfigError::Missing(p.to_path_buf()));
        }
        let mut merged = cli;
        merged.fill_from(ConfigLayer::from_env(&env));
        for path in config_paths(config_file, &env) {
            if path.is_file() {
                log::debug!("reading config {}", path.display());
                merged.fill_from(ConfigLayer::from_file(&path)?);
            }
        }
        Ok(Self::from(merged))
    }

    /// [`AppConfig::resolve`] against the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::resolve`].
    pub fn load(cli: ConfigLayer, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve(cli, config_file, |k| std::env::var(k).ok())
    }
}
