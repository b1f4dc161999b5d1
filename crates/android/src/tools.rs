//! Command shapes for the Android build-tools
//!
//! Pure argument builders for `zipalign` and `apksigner`, plus the artifact
//! paths one pipeline run reads and writes.

use autosign_core::config::SignConfig;
use autosign_core::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Byte alignment passed to zipalign
pub const ALIGNMENT: &str = "4";

/// Suffix of aligned, unsigned artifacts
pub const ALIGNED_SUFFIX: &str = "_aligned.apk";
/// Suffix of signed artifacts
pub const SIGNED_SUFFIX: &str = "_signed.apk";

/// Files touched by one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// APK being released
    pub input: PathBuf,
    /// `<aligned_dir>/<stem>_aligned.apk`
    pub aligned: PathBuf,
    /// `<signed_dir>/<stem>_signed.apk`
    pub signed: PathBuf,
}

impl ArtifactPaths {
    /// Derive output paths for `apk` from its file name without extension.
    ///
    /// The extension starts at the last `.`, so a bare `.apk` has an empty
    /// stem and yields `_aligned.apk`.
    pub fn derive(apk: &Path, config: &SignConfig) -> Result<Self> {
        let name = apk
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::validation(format!("Not a file name: {}", apk.display()))
            })?;
        let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);

        Ok(Self {
            input: apk.to_path_buf(),
            aligned: config.aligned_dir.join(format!("{stem}{ALIGNED_SUFFIX}")),
            signed: config.signed_dir.join(format!("{stem}{SIGNED_SUFFIX}")),
        })
    }
}

/// `zipalign -f -v 4 <input> <output>`
#[must_use]
pub fn align_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "-v".into(),
        ALIGNMENT.into(),
        input.into(),
        output.into(),
    ]
}

/// `apksigner sign --ks .. --ks-key-alias .. --ks-pass pass:.. --key-pass pass:.. --out <signed> <aligned>`
#[must_use]
pub fn sign_args(config: &SignConfig, aligned: &Path, signed: &Path) -> Vec<OsString> {
    vec![
        "sign".into(),
        "--ks".into(),
        config.keystore_path.as_os_str().into(),
        "--ks-key-alias".into(),
        config.alias.as_str().into(),
        "--ks-pass".into(),
        format!("pass:{}", config.store_password).into(),
        "--key-pass".into(),
        format!("pass:{}", config.key_password).into(),
        "--out".into(),
        signed.into(),
        aligned.into(),
    ]
}

/// `apksigner verify --verbose <signed>`
#[must_use]
pub fn verify_args(signed: &Path) -> Vec<OsString> {
    vec!["verify".into(), "--verbose".into(), signed.into()]
}
