use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connectivity::DEFAULT_CHECK_URL;
use crate::probe::ProbeSettings;
use crate::wander::WanderSettings;

/// Environment variable naming the WiFi interface to use.
pub const INTERFACE_ENV: &str = "SCAN_INTERFACE";

/// Interface used when nothing else names one.
pub const DEFAULT_INTERFACE: &str = "wlan0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interface: Option<String>,
    pub scan_interval_secs: u64,
    pub probe_pause_secs: u64,
    pub connect_timeout_secs: u64,
    pub disconnect_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub check_url: String,
    pub check_timeout_secs: u64,
    /// SSIDs never considered probe candidates.
    pub ignored_ssids: Vec<String>,
    /// Where session logs go; the current directory when unset.
    pub log_dir: Option<PathBuf>,
    pub forget_probed_networks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: None,
            scan_interval_secs: 10,
            probe_pause_secs: 1,
            connect_timeout_secs: 60,
            disconnect_timeout_secs: 10,
            tool_timeout_secs: 30,
            check_url: DEFAULT_CHECK_URL.to_string(),
            check_timeout_secs: 10,
            ignored_ssids: Vec::new(),
            log_dir: None,
            forget_probed_networks: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Pick the interface: explicit flag, then `SCAN_INTERFACE`, then the
    /// config file, then [`DEFAULT_INTERFACE`].
    pub fn resolve_interface(&self, flag: Option<&str>, env: Option<String>) -> String {
        flag.map(str::to_string)
            .or(env.filter(|v| !v.trim().is_empty()))
            .or_else(|| self.interface.clone())
            .unwrap_or_else(|| DEFAULT_INTERFACE.to_string())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            disconnect_timeout: Duration::from_secs(self.disconnect_timeout_secs),
            forget_probed: self.forget_probed_networks,
        }
    }

    pub fn wander_settings(&self) -> WanderSettings {
        WanderSettings {
            scan_interval: Duration::from_secs(self.scan_interval_secs),
            probe_pause: Duration::from_secs(self.probe_pause_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("wifi-wander").join("config.toml"))
}
