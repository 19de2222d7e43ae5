//! Optional user configuration file.
//!
//! The file lives at `<config dir>/mipdata/config.toml`, or in the directory
//! named by `MIPDATA_CONFIG_DIR`:
//!
//! ```toml
//! [defaults]
//! cache_dir = "~/benchmarks/mipdata"
//! lock_timeout_secs = 120
//! http_timeout_secs = 30
//! verbosity = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use mipdata_core::{DEFAULT_CACHE_DIR, DEFAULT_HTTP_TIMEOUT, DEFAULT_LOCK_TIMEOUT};

/// Overrides the directory searched for `config.toml`.
pub const CONFIG_DIR_ENV: &str = "MIPDATA_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub cache_dir: Option<PathBuf>,
    pub lock_timeout_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub verbosity: Option<u8>,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub lock_timeout: Duration,
    pub http_timeout: Duration,
    pub verbosity: u8,
}

/// Directory holding `config.toml`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    directories::BaseDirs::new().map(|d| d.config_dir().join("mipdata"))
}

impl Config {
    /// Load the config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILE)),
            None => {
                tracing::debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge with command-line values. `cache_dir` already carries the
    /// environment fallback from clap.
    pub fn settings(&self, cache_dir: Option<&Path>, verbose: u8) -> Settings {
        let defaults = &self.defaults;
        let cache_dir = cache_dir
            .map(Path::to_path_buf)
            .or_else(|| defaults.cache_dir.as_deref().map(expand_tilde))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        Settings {
            cache_dir,
            lock_timeout: defaults
                .lock_timeout_secs
                .map_or(DEFAULT_LOCK_TIMEOUT, Duration::from_secs),
            http_timeout: defaults
                .http_timeout_secs
                .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs),
            verbosity: if verbose > 0 {
                verbose
            } else {
                defaults.verbosity.unwrap_or(0)
            },
        }
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(dirs) = directories::BaseDirs::new()
    {
        return dirs.home_dir().join(rest);
    }
    path.to_path_buf()
}
