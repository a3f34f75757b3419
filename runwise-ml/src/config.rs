//! Configuration for runwise.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides.

use crate::display::Color;
use crate::error::MlError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunwiseConfig {
    /// Terminal output.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Registry naming defaults.
    #[serde(default)]
    pub naming: NamingConfig,
    /// Progress reporting.
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Terminal output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Emit ANSI color codes.
    #[serde(default = "default_true")]
    pub color: bool,
    /// Palette name used to highlight improved metrics.
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            highlight_color: default_highlight_color(),
        }
    }
}

impl DisplayConfig {
    /// Highlight `s` if color output is enabled.
    pub fn highlight(&self, s: &str) -> Result<String, MlError> {
        if !self.color {
            return Ok(s.to_string());
        }
        Ok(self.highlight_color.parse::<Color>()?.paint(s))
    }
}

fn default_highlight_color() -> String {
    "green".to_string()
}

/// Naming used when normalizing generic registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Fixed key for unnamed items; positional indices when unset.
    #[serde(default)]
    pub default_name: Option<String>,
}

/// Progress reporting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Report throughput every this many iterations.
    #[serde(default = "default_report_every")]
    pub report_every: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            report_every: default_report_every(),
        }
    }
}

fn default_report_every() -> usize {
    100
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `runwise_ml=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `RUNWISE_`)
/// 3. Workspace-local config (`.runwise/config.toml`)
/// 4. User config (`~/.config/runwise/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RunwiseConfig>,
) -> Result<RunwiseConfig, MlError> {
    let mut figment = Figment::from(Serialized::defaults(RunwiseConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "runwise", "runwise") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".runwise").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // RUNWISE_DISPLAY__COLOR, RUNWISE_LOGGING__LEVEL, ...
    figment = figment.merge(Env::prefixed("RUNWISE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(|e| MlError::from(Box::new(e)))
}
