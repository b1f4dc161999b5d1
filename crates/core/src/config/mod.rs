//! Configuration: the signing properties file and optional tool settings
//!
//! - [`SignConfig`]: tool paths, keystore credentials and output directories,
//!   persisted as `config/signature.properties`
//! - [`ConfigResolver`]: loads that file or bootstraps debug defaults
//! - [`Settings`]: optional `autosign.toml` controlling layout and logging

mod layout;
mod loader;
pub mod properties;
mod resolver;
mod schema;
mod sign_config;

pub use layout::{Layout, BUILD_DIR, CONFIG_DIR, PROPERTIES_FILE};
pub use loader::SettingsFile;
pub use properties::Properties;
pub use resolver::{ConfigResolver, Resolution};
pub use schema::*;
pub use sign_config::{keys, SignConfig, ToolKind, DEBUG_ALIAS, DEBUG_PASSWORD, PROPERTIES_HEADER};
