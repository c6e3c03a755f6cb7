use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::paths::get_config_path;

/// Environment variable that replaces the default plugin search path.
pub const PLUGINS_DIR_ENV: &str = "PIPECTL_PLUGINS_DIR";

/// Plugin enable/disable configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Plugins treated as absent during dispatch (enabled by default)
    #[serde(default)]
    pub disabled: HashSet<String>,
}

impl PluginsConfig {
    /// Check if a plugin is enabled (not in disabled set).
    ///
    /// Names compare exactly, the same way command routing does.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name)
    }

    pub fn disable(&mut self, name: &str) {
        self.disabled.insert(name.to_string());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to the data directory instead of stderr
    #[serde(default)]
    pub file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {:?}", config_path))
    }
}

/// Process environment inputs to plugin resolution, captured once at startup.
///
/// Resolution code never reads the environment itself; everything it needs
/// is threaded through this value so tests can build one by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchEnv {
    /// Value of `PIPECTL_PLUGINS_DIR`, if set.
    pub plugins_dir_override: Option<OsString>,
    /// Value of `XDG_CONFIG_HOME`, if set.
    pub xdg_config_home: Option<OsString>,
    pub home_dir: Option<PathBuf>,
    /// Raw `PATH` value, if set.
    pub path: Option<OsString>,
}

impl DispatchEnv {
    pub fn from_env() -> Self {
        Self {
            plugins_dir_override: env::var_os(PLUGINS_DIR_ENV),
            xdg_config_home: env::var_os("XDG_CONFIG_HOME"),
            home_dir: dirs::home_dir(),
            path: env::var_os("PATH"),
        }
    }

    /// An environment with nothing but the override set.
    pub fn with_plugins_dir(dir: impl Into<OsString>) -> Self {
        Self {
            plugins_dir_override: Some(dir.into()),
            ..Self::default()
        }
    }
}
