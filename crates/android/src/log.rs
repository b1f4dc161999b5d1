//! Human-readable status lines produced by a pipeline run

use chrono::{DateTime, Local};
use serde::Serialize;

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Neutral information
    Info,
    /// A step is starting
    Step,
    /// A step finished successfully
    Success,
    /// Non-fatal problem
    Warning,
    /// Fatal problem; the run stops
    Error,
}

/// One line of a run's log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn step(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Step, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Mirror this line into tracing at debug level.
    ///
    /// Sinks own user-facing output; the mirror only shows up with `-vv` or
    /// `RUST_LOG=autosign::pipeline=debug`.
    pub fn trace(&self) {
        tracing::debug!(target: "autosign::pipeline", level = ?self.level, "{}", self.message);
    }
}

/// Receives status lines in the order they are produced
pub trait LogSink {
    fn emit(&mut self, line: LogLine);
}

impl LogSink for Vec<LogLine> {
    fn emit(&mut self, line: LogLine) {
        self.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut sink: Vec<LogLine> = Vec::new();
        sink.emit(LogLine::step("first"));
        sink.emit(LogLine::error("second"));

        let messages: Vec<_> = sink.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert_eq!(sink[1].level, LogLevel::Error);
    }

    #[test]
    fn test_serializes_lowercase_level() {
        let json = serde_json::to_string(&LogLine::warning("careful")).unwrap();
        assert!(json.contains("\"level\":\"warning\""));
    }
}
