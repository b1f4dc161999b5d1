//! Terminal rendering for autosign
//!
//! - Status messages
//! - Pipeline log lines
//! - Health reports

#![warn(missing_docs)]

pub mod output;
