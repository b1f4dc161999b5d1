//! Bundled resource materialization
//!
//! The signing tools (`zipalign.exe`, `apksigner.bat`, `apksigner.jar`) and the
//! debug keystore ship alongside the application. The resolver copies them
//! into the config directory on first run through a [`ResourceProvider`], so
//! it never depends on how the bundle is packaged.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Alignment tool executable
pub const ZIPALIGN: &str = "zipalign.exe";
/// Signing tool launcher script
pub const APKSIGNER: &str = "apksigner.bat";
/// Runtime dependency of the launcher script
pub const APKSIGNER_JAR: &str = "apksigner.jar";
/// Debug keystore
pub const KEYSTORE: &str = "signature.keystore";

/// Every resource name the application bundles
pub const BUNDLED: [&str; 4] = [ZIPALIGN, APKSIGNER, APKSIGNER_JAR, KEYSTORE];

/// Source of bundled resources.
///
/// `Ok(None)` means the bundle does not contain `name`.
pub trait ResourceProvider: Send + Sync {
    /// Read the full contents of resource `name`
    fn open(&self, name: &str) -> Result<Option<Vec<u8>>>;
}

/// Resources stored as plain files in a directory
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    dir: PathBuf,
}

impl DirectoryResources {
    /// Serve resources from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The `resources` directory next to the running executable
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| Error::resource("Executable has no parent directory"))?
            .join("resources");
        Ok(Self::new(dir))
    }

    /// Directory resources are read from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResourceProvider for DirectoryResources {
    fn open(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.dir.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::from(e).with_context(format!("Reading resource {name}"))),
        }
    }
}

/// In-memory bundle of `'static` bytes.
///
/// Lets tests and embedding applications supply resources without a
/// `resources/` directory on disk.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<&'static str, &'static [u8]>,
}

impl EmbeddedResources {
    /// Create an empty bundle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the bundle
    #[must_use]
    pub fn with(mut self, name: &'static str, bytes: &'static [u8]) -> Self {
        self.entries.insert(name, bytes);
        self
    }
}

impl ResourceProvider for EmbeddedResources {
    fn open(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(name).map(|bytes| bytes.to_vec()))
    }
}

/// What happened when a resource was materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Target already existed; nothing was read or written
    AlreadyPresent,
    /// Resource was copied to the target
    Copied {
        /// Number of bytes written
        bytes: u64,
    },
    /// The bundle does not contain the resource
    Unavailable,
    /// Reading or writing failed
    Failed(String),
}

impl Materialized {
    /// Whether this call wrote the target file
    #[must_use]
    pub fn copied(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }
}

/// Copy resource `name` to `target` unless `target` already exists.
///
/// Failures are logged at debug level and returned as
/// [`Materialized::Failed`] for the caller to report; they never abort it.
pub fn materialize(provider: &dyn ResourceProvider, name: &str, target: &Path) -> Materialized {
    if target.exists() {
        return Materialized::AlreadyPresent;
    }

    let bytes = match provider.open(name) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!(resource = name, "Bundled resource not found");
            return Materialized::Unavailable;
        }
        Err(e) => {
            tracing::debug!(resource = name, error = %e, "Failed to read bundled resource");
            return Materialized::Failed(e.to_string());
        }
    };

    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::debug!(resource = name, error = %e, "Failed to create resource directory");
            return Materialized::Failed(e.to_string());
        }
    }

    match fs::write(target, &bytes) {
        Ok(()) => {
            tracing::info!(resource = name, target = %target.display(), "Copied bundled resource");
            Materialized::Copied {
                bytes: bytes.len() as u64,
            }
        }
        Err(e) => {
            tracing::debug!(resource = name, error = %e, "Failed to write bundled resource");
            Materialized::Failed(e.to_string())
        }
    }
}
