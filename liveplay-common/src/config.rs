//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument / environment variable (handled by the binary)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing or broken config file is never fatal: a warning is logged and
//! the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default HTTP control port
pub const DEFAULT_PORT: u16 = 8080;

/// Default debug state inspector cadence
pub const DEFAULT_INSPECTOR_INTERVAL_MS: u64 = 500;

/// Default timeout for custom-action HTTP requests
pub const DEFAULT_HTTP_ACTION_TIMEOUT_MS: u64 = 5000;

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: u16,
    /// Project file opened at startup
    pub project: Option<PathBuf>,
    /// tracing EnvFilter directive, e.g. `info` or `liveplay_ap=debug`
    pub log_level: String,
    /// 0 disables the state inspector
    pub inspector_interval_ms: u64,
    pub http_action_timeout_ms: u64,
    /// Fade curve for transport volume ramps
    pub fade_curve: String,
    /// Use the clock-driven transport instead of an audio device
    pub dry_run: bool,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            project: None,
            log_level: "info".to_string(),
            inspector_interval_ms: DEFAULT_INSPECTOR_INTERVAL_MS,
            http_action_timeout_ms: DEFAULT_HTTP_ACTION_TIMEOUT_MS,
            fade_curve: "linear".to_string(),
            dry_run: true,
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if crate::FadeCurve::parse(&self.fade_curve).is_none() {
            return Err(Error::Config(format!(
                "unknown fade_curve '{}'",
                self.fade_curve
            )));
        }
        Ok(())
    }

    /// Load from an explicit path, else the platform config file, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let Some(path) = path else {
            debug!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Failed to load config {}: {} (using defaults)",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// Platform config file location, if one exists
///
/// Linux checks `~/.config/liveplay/config.toml` then
/// `/etc/liveplay/config.toml`; other platforms use the user config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("liveplay").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/liveplay/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the startup project: CLI/env value, then TOML
pub fn resolve_project_path(cli_arg: Option<&Path>, config: &TomlConfig) -> Option<PathBuf> {
    cli_arg
        .map(Path::to_path_buf)
        .or_else(|| config.project.clone())
}
