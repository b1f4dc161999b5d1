//! Signing configuration resolution
//!
//! Loads `signature.properties`, or on first run materializes the bundled
//! tools and debug keystore and writes debug defaults for later runs.

use super::layout::Layout;
use super::properties::Properties;
use super::sign_config::{SignConfig, PROPERTIES_HEADER};
use crate::error::{Error, Result, ResultExt};
use crate::resources::{self, materialize, Materialized, ResourceProvider};
use std::fs;
use std::sync::Arc;

/// Outcome of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved configuration
    pub config: SignConfig,
    /// Whether defaults were synthesized and written this time
    pub created_defaults: bool,
    /// Resource materialization attempts, in order
    pub materialized: Vec<(&'static str, Materialized)>,
}

impl Resolution {
    /// Names of resources copied during this resolution
    pub fn copied(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.materialized
            .iter()
            .filter(|(_, m)| m.copied())
            .map(|(name, _)| *name)
    }
}

/// Resolves a [`SignConfig`] for one working layout
#[derive(Clone)]
pub struct ConfigResolver {
    layout: Layout,
    resources: Arc<dyn ResourceProvider>,
}

impl ConfigResolver {
    /// Create a resolver reading bundled resources from `resources`
    pub fn new(layout: Layout, resources: Arc<dyn ResourceProvider>) -> Self {
        Self { layout, resources }
    }

    /// The layout this resolver works in
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Load the configuration, bootstrapping defaults on first run
    pub fn resolve(&self) -> Result<Resolution> {
        self.layout.ensure_dirs()?;

        let mut materialized = Vec::new();
        self.materialize_into(resources::APKSIGNER_JAR, &mut materialized);

        let path = self.layout.properties_file();
        if path.exists() {
            let config = self.load()?;
            tracing::debug!(path = %path.display(), "Loaded signing configuration");
            return Ok(Resolution {
                config,
                created_defaults: false,
                materialized,
            });
        }

        for name in [resources::ZIPALIGN, resources::APKSIGNER, resources::KEYSTORE] {
            self.materialize_into(name, &mut materialized);
        }

        let config = SignConfig::debug_defaults(&self.layout);
        self.write(&config)?;
        tracing::info!(path = %path.display(), "Generated default signing configuration");

        Ok(Resolution {
            config,
            created_defaults: true,
            materialized,
        })
    }

    /// Discard the properties file and resolve again from defaults.
    ///
    /// Materialized tools are left in place.
    pub fn reset(&self) -> Result<Resolution> {
        let path = self.layout.properties_file();
        if path.exists() {
            fs::remove_file(&path)
                .map_err(Error::from)
                .context(format!("Removing {}", path.display()))?;
        }
        self.resolve()
    }

    /// Parse the existing properties file
    pub fn load(&self) -> Result<SignConfig> {
        let path = self.layout.properties_file();
        let text = fs::read_to_string(&path)
            .map_err(|e| {
                Error::config(format!("Failed to read {}: {}", path.display(), e)).with_source(e)
            })?;
        SignConfig::from_properties(&Properties::parse(&text), &self.layout, &path)
    }

    /// Serialize `config` to the properties file
    pub fn write(&self, config: &SignConfig) -> Result<()> {
        let path = self.layout.properties_file();
        let text = config.to_properties().render(&PROPERTIES_HEADER);
        fs::write(&path, text).map_err(|e| {
            Error::config(format!("Failed to write {}: {}", path.display(), e)).with_source(e)
        })
    }

    fn materialize_into(
        &self,
        name: &'static str,
        log: &mut Vec<(&'static str, Materialized)>,
    ) {
        let outcome = materialize(self.resources.as_ref(), name, &self.layout.resource_path(name));
        log.push((name, outcome));
    }
}
