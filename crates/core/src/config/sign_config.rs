//! Signing configuration record

use super::layout::Layout;
use super::properties::Properties;
use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Property keys recognised in `signature.properties`
pub mod keys {
    #![allow(missing_docs)]
    pub const ZIPALIGN_PATH: &str = "zipalignPath";
    pub const APKSIGNER_PATH: &str = "apksignerPath";
    pub const KEYSTORE_PATH: &str = "keystorePath";
    pub const ALIAS: &str = "alias";
    pub const STORE_PASSWORD: &str = "storePassword";
    pub const KEY_PASSWORD: &str = "keyPassword";
    pub const ALIGNED_DIR: &str = "alignedDir";
    pub const SIGNED_DIR: &str = "signedDir";
}

/// Alias of the key inside the Android debug keystore
pub const DEBUG_ALIAS: &str = "androiddebugkey";
/// Store and key password of the Android debug keystore
pub const DEBUG_PASSWORD: &str = "android";

/// Header written above freshly generated defaults
pub const PROPERTIES_HEADER: [&str; 2] = [
    "Automatic signing tool configuration",
    "Every value below may be replaced freely",
];

/// External prerequisites a pipeline run needs on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Alignment executable
    Zipalign,
    /// Signing executable or launcher script
    Apksigner,
    /// Credential store
    Keystore,
}

impl ToolKind {
    /// All kinds, in the order they are validated
    pub const ALL: [ToolKind; 3] = [Self::Zipalign, Self::Apksigner, Self::Keystore];

    /// Name used in user-facing messages
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Zipalign => "zipalign tool",
            Self::Apksigner => "apksigner tool",
            Self::Keystore => "keystore file",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything needed to align, sign and verify an APK.
///
/// Built once by the resolver and never mutated afterwards. `Debug` and
/// `Serialize` both mask the passwords.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignConfig {
    /// Alignment tool executable
    pub zipalign_path: PathBuf,
    /// Signing tool executable or script
    pub apksigner_path: PathBuf,
    /// Signing credential store
    pub keystore_path: PathBuf,
    /// Key alias within the store
    pub alias: String,
    /// Credential store password
    #[serde(serialize_with = "masked")]
    pub store_password: String,
    /// Private key password for `alias`
    #[serde(serialize_with = "masked")]
    pub key_password: String,
    /// Output directory for aligned, unsigned artifacts
    pub aligned_dir: PathBuf,
    /// Output directory for signed artifacts
    pub signed_dir: PathBuf,
}

#[allow(clippy::ptr_arg)]
fn masked<S: Serializer>(_: &String, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str("********")
}

impl fmt::Debug for SignConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignConfig")
            .field("zipalign_path", &self.zipalign_path)
            .field("apksigner_path", &self.apksigner_path)
            .field("keystore_path", &self.keystore_path)
            .field("alias", &self.alias)
            .field("store_password", &"********")
            .field("key_password", &"********")
            .field("aligned_dir", &self.aligned_dir)
            .field("signed_dir", &self.signed_dir)
            .finish()
    }
}

impl SignConfig {
    /// Debug-keystore defaults pointing at the materialized bundle in `layout`
    #[must_use]
    pub fn debug_defaults(layout: &Layout) -> Self {
        Self {
            zipalign_path: layout.resource_path(crate::resources::ZIPALIGN),
            apksigner_path: layout.resource_path(crate::resources::APKSIGNER),
            keystore_path: layout.resource_path(crate::resources::KEYSTORE),
            alias: DEBUG_ALIAS.to_string(),
            store_password: DEBUG_PASSWORD.to_string(),
            key_password: DEBUG_PASSWORD.to_string(),
            aligned_dir: layout.aligned_dir(),
            signed_dir: layout.signed_dir(),
        }
    }

    /// Build from parsed properties.
    ///
    /// `alignedDir` and `signedDir` fall back to the layout's defaults; every
    /// other key is required and must be non-empty. `source` only feeds error
    /// messages.
    pub fn from_properties(props: &Properties, layout: &Layout, source: &Path) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            props
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .map(String::from)
                .ok_or_else(|| Error::missing_key(source, key))
        };
        let dir_or = |key: &str, fallback: PathBuf| -> PathBuf {
            props
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .map_or(fallback, PathBuf::from)
        };

        Ok(Self {
            zipalign_path: PathBuf::from(required(keys::ZIPALIGN_PATH)?),
            apksigner_path: PathBuf::from(required(keys::APKSIGNER_PATH)?),
            keystore_path: PathBuf::from(required(keys::KEYSTORE_PATH)?),
            alias: required(keys::ALIAS)?,
            store_password: required(keys::STORE_PASSWORD)?,
            key_password: required(keys::KEY_PASSWORD)?,
            aligned_dir: dir_or(keys::ALIGNED_DIR, layout.aligned_dir()),
            signed_dir: dir_or(keys::SIGNED_DIR, layout.signed_dir()),
        })
    }

    /// Convert to properties in the canonical key order
    #[must_use]
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.set(keys::ZIPALIGN_PATH, self.zipalign_path.display().to_string());
        props.set(keys::APKSIGNER_PATH, self.apksigner_path.display().to_string());
        props.set(keys::KEYSTORE_PATH, self.keystore_path.display().to_string());
        props.set(keys::ALIAS, self.alias.as_str());
        props.set(keys::STORE_PASSWORD, self.store_password.as_str());
        props.set(keys::KEY_PASSWORD, self.key_password.as_str());
        props.set(keys::ALIGNED_DIR, self.aligned_dir.display().to_string());
        props.set(keys::SIGNED_DIR, self.signed_dir.display().to_string());
        props
    }

    /// Configured path of a prerequisite
    #[must_use]
    pub fn tool_path(&self, kind: ToolKind) -> &Path {
        match kind {
            ToolKind::Zipalign => &self.zipalign_path,
            ToolKind::Apksigner => &self.apksigner_path,
            ToolKind::Keystore => &self.keystore_path,
        }
    }

    /// Every prerequisite whose configured path does not exist
    #[must_use]
    pub fn missing_tools(&self) -> Vec<(ToolKind, &Path)> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| (kind, self.tool_path(kind)))
            .filter(|(_, path)| !path.exists())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path()).unwrap();
        (dir, layout)
    }

    #[test]
    fn test_debug_defaults() {
        let (_dir, layout) = layout();
        let config = SignConfig::debug_defaults(&layout);

        assert_eq!(config.alias, "androiddebugkey");
        assert_eq!(config.store_password, "android");
        assert_eq!(config.key_password, "android");
        assert!(config.keystore_path.ends_with("config/signature.keystore"));
        assert!(config.signed_dir.ends_with("build_product/signed"));
    }

    #[test]
    fn test_properties_round_trip() {
        let (_dir, layout) = layout();
        let config = SignConfig::debug_defaults(&layout);

        let text = config.to_properties().render(&PROPERTIES_HEADER);
        let parsed = Properties::parse(&text);
        let restored = SignConfig::from_properties(&parsed, &layout, Path::new("x")).unwrap();

        assert_eq!(restored, config);
    }

    #[test]
    fn test_output_dirs_default_when_absent() {
        let (_dir, layout) = layout();
        let props = Properties::parse(
            "zipalignPath=/z\napksignerPath=/a\nkeystorePath=/k\nalias=rel\nstorePassword=s\nkeyPassword=k\n",
        );

        let config = SignConfig::from_properties(&props, &layout, Path::new("x")).unwrap();

        assert_eq!(config.aligned_dir, layout.aligned_dir());
        assert_eq!(config.signed_dir, layout.signed_dir());
        assert_eq!(config.alias, "rel");
    }

    #[test]
    fn test_missing_required_key_is_rejected() {
        let (_dir, layout) = layout();
        let props = Properties::parse("zipalignPath=/z\napksignerPath=\nkeystorePath=/k\n");

        let err = SignConfig::from_properties(&props, &layout, Path::new("signature.properties"))
            .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::ConfigValidationError);
        assert!(err.message.contains("apksignerPath"));
    }

    #[test]
    fn test_missing_tools_reports_each_in_order() {
        let (dir, layout) = layout();
        let mut config = SignConfig::debug_defaults(&layout);
        config.apksigner_path = dir.path().join("present.bat");
        std::fs::write(&config.apksigner_path, "").unwrap();

        let missing: Vec<_> = config.missing_tools().into_iter().map(|(k, _)| k).collect();

        assert_eq!(missing, vec![ToolKind::Zipalign, ToolKind::Keystore]);
    }

    #[test]
    fn test_debug_and_json_mask_passwords() {
        let (_dir, layout) = layout();
        let mut config = SignConfig::debug_defaults(&layout);
        config.store_password = "hunter2".to_string();

        assert!(!format!("{config:?}").contains("hunter2"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"alias\":\"androiddebugkey\""));
    }
}
