//! Logging and run telemetry for autosign
//!
//! - Structured logging with tracing, written to stderr
//! - A per-process session id for correlating log lines
//! - Timers and structured events for signing runs

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Level used when neither `RUST_LOG` nor a flag says otherwise
pub const DEFAULT_LEVEL: &str = "warn";

/// Initialize with custom configuration.
///
/// `RUST_LOG` takes precedence over `config.log_level`.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .compact());

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Map CLI verbosity onto a filter directive.
///
/// `quiet` wins over any `-v`; otherwise each `-v` raises one level above
/// `default`, saturating at `trace`.
#[must_use]
pub fn level_for_verbosity(verbose: u8, quiet: bool, default: &str) -> String {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

    if quiet {
        return "error".to_string();
    }
    let base = LEVELS
        .iter()
        .position(|l| l.eq_ignore_ascii_case(default.trim()))
        .unwrap_or(1);
    let index = (base + usize::from(verbose)).min(LEVELS.len() - 1);
    LEVELS[index].to_string()
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LEVEL.to_string(),
            ansi: true,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Time elapsed so far
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.name,
            duration_ms = duration.as_millis(),
            "Timer completed"
        );
        duration
    }
}

/// Event for structured logging
#[derive(Debug, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub event_type: String,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id().to_string(),
            event_type: event_type.into(),
            data,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            session_id = %self.session_id,
            event_type = %self.event_type,
            data = %self.data,
            "Event recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0, false, "warn"), "warn");
        assert_eq!(level_for_verbosity(1, false, "warn"), "info");
        assert_eq!(level_for_verbosity(2, false, "warn"), "debug");
        assert_eq!(level_for_verbosity(9, false, "warn"), "trace");
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        assert_eq!(level_for_verbosity(3, true, "info"), "error");
    }

    #[test]
    fn test_unknown_default_falls_back_to_warn() {
        assert_eq!(level_for_verbosity(0, false, "chatty"), "warn");
        assert_eq!(level_for_verbosity(1, false, " INFO "), "debug");
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("test_operation");
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_event_carries_session() {
        let event = Event::new("sign", serde_json::json!({ "result": "success" }));
        assert_eq!(event.session_id, session_id());
        assert_eq!(event.data["result"], "success");
    }
}
