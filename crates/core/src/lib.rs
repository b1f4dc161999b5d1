//! Core of the APK auto-signing tool
//!
//! This crate provides everything below the pipeline itself:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: the `signature.properties` signing config and its resolver
//! - **Resources**: materializing bundled tools on first run
//! - **Process execution**: streaming command execution behind a runner trait
//! - **Health checks**: verify tool paths and the Java runtime
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autosign_core::config::{ConfigResolver, Layout};
//! use autosign_core::resources::DirectoryResources;
//!
//! let layout = Layout::new(".").expect("working directory");
//! let resolver = ConfigResolver::new(layout, Arc::new(DirectoryResources::new("resources")));
//! let config = resolver.resolve().expect("signing config").config;
//!
//! for (kind, path) in config.missing_tools() {
//!     eprintln!("{kind} missing at {}", path.display());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod health;
pub mod process;
pub mod resources;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigResolver, Layout, SignConfig, ToolKind};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::health::{HealthChecker, HealthReport, HealthStatus};
    pub use crate::process::{CommandRunner, SystemRunner};
    pub use crate::resources::{DirectoryResources, EmbeddedResources, ResourceProvider};
}
