//! Console configuration, read from a RON file at startup.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use console_engine::{
    GatewayError, GatewaySettings, OfflineSettings, DEFAULT_BASE_URL, DEFAULT_CACHE_VERSION,
};
use console_logging::{LogDestination, LogLevel};
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "console.ron";
const CONFIG_ENV: &str = "CNE_CONSOLE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ConsoleConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub offline: OfflineConfig,
    pub log_destination: LogDestination,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OfflineConfig {
    pub enabled: bool,
    pub cache_version: String,
    pub cache_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            offline: OfflineConfig::default(),
            log_destination: LogDestination::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            cache_dir: PathBuf::from("./.cne-console-cache"),
        }
    }
}

impl ConsoleConfig {
    pub fn gateway_settings(&self) -> Result<GatewaySettings, GatewayError> {
        let mut settings = GatewaySettings::new(&self.base_url)?;
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        Ok(settings)
    }

    pub fn offline_settings(&self) -> OfflineSettings {
        OfflineSettings {
            enabled: self.offline.enabled,
            cache_version: self.offline.cache_version.clone(),
            cache_dir: self.offline.cache_dir.clone(),
        }
    }
}

/// `$CNE_CONSOLE_CONFIG` when set, otherwise `console.ron` in the working
/// directory.
pub(crate) fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// A missing file is not an error and yields the defaults.
pub(crate) fn load_config(path: &Path) -> anyhow::Result<ConsoleConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConsoleConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };

    ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}
