//! Application configuration
//!
//! A `Config` is assembled in layers, later layers winning:
//! built-in defaults, then `config.toml`, then `SHOWFOLIO_*` environment
//! variables. The file is found at `--config`, else `SHOWFOLIO_CONFIG`,
//! else `~/.config/showfolio/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analytics::{DEFAULT_TRAFFIC_WINDOW_DAYS, MAX_TRAFFIC_WINDOW_DAYS};

/// Default number of consecutive failed sign-ins before an email is throttled
pub const DEFAULT_MAX_FAILED_LOGINS: u32 = 5;

/// Keys accepted by [`Config::set`]
pub const KEYS: [&str; 4] = [
    "data_dir",
    "log_file",
    "traffic_window_days",
    "max_failed_logins",
];

const ENV_CONFIG: &str = "SHOWFOLIO_CONFIG";
const ENV_DATA_DIR: &str = "SHOWFOLIO_DATA_DIR";
const ENV_LOG_FILE: &str = "SHOWFOLIO_LOG_FILE";
const ENV_TRAFFIC_WINDOW_DAYS: &str = "SHOWFOLIO_TRAFFIC_WINDOW_DAYS";
const ENV_MAX_FAILED_LOGINS: &str = "SHOWFOLIO_MAX_FAILED_LOGINS";

/// Where ShowFolio keeps its data and how it behaves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Holds `showfolio.db` and, unless `log_file` is set, `showfolio.log`
    pub data_dir: PathBuf,

    pub log_file: Option<PathBuf>,

    /// Days of per-day traffic kept on each profile
    pub traffic_window_days: u32,

    /// Consecutive failed sign-ins allowed before throttling
    pub max_failed_logins: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("showfolio"),
            log_file: None,
            traffic_window_days: DEFAULT_TRAFFIC_WINDOW_DAYS,
            max_failed_logins: DEFAULT_MAX_FAILED_LOGINS,
        }
    }
}

impl Config {
    /// Path of the config file in effect
    pub fn locate(cli_path: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_path {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("showfolio")
            .join("config.toml")
    }

    /// Load the effective configuration and make sure its data dir exists
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = Self::locate(cli_path);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            Self::from_toml(&content)
                .with_context(|| format!("Invalid config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;

        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory: {:?}", config.data_dir)
        })?;
        Ok(config)
    }

    /// Parse TOML; absent keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Write as TOML, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Change one setting by key name
    ///
    /// `log_file` is cleared by an empty value or `none`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value.trim()),
            "log_file" => {
                let value = value.trim();
                self.log_file = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "traffic_window_days" => {
                self.traffic_window_days = positive(key, value, MAX_TRAFFIC_WINDOW_DAYS)?
            }
            "max_failed_logins" => self.max_failed_logins = positive(key, value, u32::MAX)?,
            _ => bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Location of the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("showfolio.db")
    }

    /// Location logs are written to
    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => path.clone(),
            None => self.data_dir.join("showfolio.log"),
        }
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_TRAFFIC_WINDOW_DAYS).contains(&self.traffic_window_days) {
            bail!(
                "traffic_window_days must be between 1 and {}",
                MAX_TRAFFIC_WINDOW_DAYS
            );
        }
        if self.max_failed_logins == 0 {
            bail!("max_failed_logins must be at least 1");
        }
        Ok(())
    }

    /// Bad numeric values in the environment are skipped with a warning
    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var(ENV_LOG_FILE) {
            self.log_file = (!file.is_empty()).then(|| PathBuf::from(file));
        }
        for (var, slot, max) in [
            (
                ENV_TRAFFIC_WINDOW_DAYS,
                &mut self.traffic_window_days,
                MAX_TRAFFIC_WINDOW_DAYS,
            ),
            (ENV_MAX_FAILED_LOGINS, &mut self.max_failed_logins, u32::MAX),
        ] {
            let Ok(raw) = std::env::var(var) else {
                continue;
            };
            match positive(var, &raw, max) {
                Ok(n) => *slot = n,
                Err(_) => warn!(var, value = %raw, "ignoring out-of-range override"),
            }
        }
    }
}

fn positive(key: &str, value: &str, max: u32) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ if max < u32::MAX => bail!(
            "Invalid value for {}. Use a whole number from 1 to {}.",
            key,
            max
        ),
        _ => bail!("Invalid value for {}. Use a positive whole number.", key),
    }
}
