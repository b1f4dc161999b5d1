//! Show a finished artifact in the platform file browser
//!
//! Best effort only: failures are logged at debug level and otherwise ignored.

use std::path::Path;

/// Reveals a file to the user
pub trait Reveal: Send + Sync {
    /// Returns whether a file browser was launched
    fn reveal(&self, path: &Path) -> bool;
}

/// Selects the file in Windows Explorer; does nothing on other platforms
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorerReveal;

impl Reveal for ExplorerReveal {
    fn reveal(&self, path: &Path) -> bool {
        if !path.exists() {
            return false;
        }
        launch(path)
    }
}

#[cfg(windows)]
fn launch(path: &Path) -> bool {
    use std::os::windows::process::CommandExt;

    // explorer only accepts the quoted path glued to the switch
    match std::process::Command::new("explorer")
        .raw_arg(format!("/select,\"{}\"", path.display()))
        .spawn()
    {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Could not launch explorer");
            false
        }
    }
}

#[cfg(not(windows))]
fn launch(path: &Path) -> bool {
    tracing::debug!(path = %path.display(), "Reveal is only supported on Windows");
    false
}

/// Never reveals anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReveal;

impl Reveal for NoReveal {
    fn reveal(&self, _path: &Path) -> bool {
        false
    }
}
