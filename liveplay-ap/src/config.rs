//! liveplay-ap specific configuration
//!
//! Merges command-line values over the TOML file over compiled defaults.

use liveplay_common::config::{resolve_project_path, TomlConfig};
use liveplay_common::FadeCurve;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Values given on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub project: Option<PathBuf>,
    pub dry_run: bool,
}

/// Audio player configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub project: Option<PathBuf>,
    pub log_level: String,
    pub inspector_interval_ms: u64,
    pub http_action_timeout: Duration,
    pub fade_curve: FadeCurve,
    pub dry_run: bool,
}

impl Config {
    /// Resolve from overrides and a parsed TOML config
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let fade_curve = FadeCurve::parse(&toml.fade_curve)
            .ok_or_else(|| Error::Config(format!("unknown fade_curve '{}'", toml.fade_curve)))?;

        Ok(Self {
            port: cli.port.unwrap_or(toml.port),
            project: resolve_project_path(cli.project.as_deref(), toml),
            log_level: toml.log_level.clone(),
            inspector_interval_ms: toml.inspector_interval_ms,
            http_action_timeout: Duration::from_millis(toml.http_action_timeout_ms),
            fade_curve,
            dry_run: cli.dry_run || toml.dry_run,
        })
    }

    /// Load the TOML file (explicit path or platform default) and resolve
    pub fn load(cli: &CliOverrides, config_file: Option<&Path>) -> Result<Self> {
        let toml = TomlConfig::load_or_default(config_file);
        Self::resolve(cli, &toml)
    }
}
