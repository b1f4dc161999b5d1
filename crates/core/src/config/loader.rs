//! Settings file loading

use super::schema::Settings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Loaded settings plus the file they came from
#[derive(Debug, Clone, Default)]
pub struct SettingsFile {
    pub settings: Settings,
    pub path: Option<PathBuf>,
}

impl SettingsFile {
    /// Load from an explicit path, or search `root` for a settings file.
    ///
    /// A relative explicit path is taken from `root`. An explicit path must
    /// exist; when searching, no file means defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let explicit = explicit.map(|p| root.join(p));
        let path = match explicit.as_deref() {
            Some(p) if !p.exists() => {
                return Err(Error::new(
                    crate::error::ErrorCode::ConfigNotFound,
                    format!("Settings file not found: {}", p.display()),
                )
                .with_suggestion("Create the file or drop --settings to use defaults"));
            }
            Some(p) => Some(p.to_path_buf()),
            None => find_settings_file(root),
        };

        let settings = match &path {
            Some(p) => load_settings_file(p)?,
            None => Settings::default(),
        };

        Ok(Self { settings, path })
    }
}

/// Find a settings file in standard locations under `root`
fn find_settings_file(root: &Path) -> Option<PathBuf> {
    let candidates = ["autosign.toml", ".autosign.toml", "config/autosign.toml"];

    candidates
        .iter()
        .map(|c| root.join(c))
        .find(|p| p.is_file())
}

/// Load and parse a TOML settings file
fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read settings file {}: {}", path.display(), e))
            .with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| Error::config_parse(path, e.to_string()))
}
