//! Tool settings schema (`autosign.toml`)
//!
//! Every field is optional in the file; missing sections fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub log: LogSettings,
}

/// Directory locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSettings {
    /// Config directory, relative to the working root
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    /// Build output directory, relative to the working root
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Where bundled tools are read from on first run
    #[serde(default)]
    pub resources_dir: Option<PathBuf>,
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            build_dir: default_build_dir(),
            resources_dir: None,
        }
    }
}

fn default_config_dir() -> String {
    super::layout::CONFIG_DIR.to_string()
}

fn default_build_dir() -> String {
    super::layout::BUILD_DIR.to_string()
}

/// Pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Reveal the signed APK in the file browser after verification
    #[serde(default = "default_true")]
    pub reveal: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { reveal: true }
    }
}

fn default_true() -> bool {
    true
}

/// Logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
