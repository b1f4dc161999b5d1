//! Working-directory layout
//!
//! ```text
//! <root>/
//!   config/                  signature.properties, tools, keystore
//!   build_product/
//!     aligned/               <stem>_aligned.apk
//!     signed/                <stem>_signed.apk
//! ```

use super::schema::Settings;
use crate::error::{Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the signing configuration file inside the config directory
pub const PROPERTIES_FILE: &str = "signature.properties";

/// Default config directory name
pub const CONFIG_DIR: &str = "config";
/// Default build output directory name
pub const BUILD_DIR: &str = "build_product";

/// Resolved directory layout rooted at an absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    config_dir: PathBuf,
    build_dir: PathBuf,
}

impl Layout {
    /// Default layout under `root`
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_dirs(root, CONFIG_DIR, BUILD_DIR)
    }

    /// Layout with custom directory names. Absolute names replace the root.
    pub fn with_dirs(
        root: impl AsRef<Path>,
        config_dir: impl AsRef<Path>,
        build_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())
            .map_err(crate::error::Error::from)
            .context(format!("Resolving {}", root.as_ref().display()))?;

        Ok(Self {
            config_dir: root.join(config_dir),
            build_dir: root.join(build_dir),
            root,
        })
    }

    /// Layout described by tool settings
    pub fn from_settings(root: impl AsRef<Path>, settings: &Settings) -> Result<Self> {
        Self::with_dirs(root, &settings.paths.config_dir, &settings.paths.build_dir)
    }

    /// Absolute working root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the properties file and materialized tools
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Parent of the default output directories
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Default output directory for aligned artifacts
    #[must_use]
    pub fn aligned_dir(&self) -> PathBuf {
        self.build_dir.join("aligned")
    }

    /// Default output directory for signed artifacts
    #[must_use]
    pub fn signed_dir(&self) -> PathBuf {
        self.build_dir.join("signed")
    }

    /// Location of `signature.properties`
    #[must_use]
    pub fn properties_file(&self) -> PathBuf {
        self.config_dir.join(PROPERTIES_FILE)
    }

    /// Where bundled resource `name` is materialized
    #[must_use]
    pub fn resource_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    /// Create the config and build directories
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)
            .map_err(crate::error::Error::from)
            .context(format!("Creating {}", self.config_dir.display()))?;
        fs::create_dir_all(&self.build_dir)
            .map_err(crate::error::Error::from)
            .context(format!("Creating {}", self.build_dir.display()))?;
        Ok(())
    }
}
