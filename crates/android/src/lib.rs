//! APK release pipeline
//!
//! This crate provides:
//! - Command shapes for `zipalign` and `apksigner`
//! - The align, sign and verify pipeline
//! - Status lines and sinks
//! - A session state machine that runs the pipeline off the owning thread

pub mod log;
pub mod pipeline;
pub mod reveal;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testing;

pub use log::{LogLevel, LogLine, LogSink};
pub use pipeline::{run_pipeline, PipelineEnv, PipelineOutcome, Step};
pub use reveal::{ExplorerReveal, NoReveal, Reveal};
pub use session::{RunResult, Session, SessionError, SessionEvent, SessionState};
pub use tools::ArtifactPaths;
