//! Environment checks for the signing pipeline
//!
//! Verifies, before anything is spawned:
//! - The configured zipalign, apksigner and keystore paths exist
//! - A Java runtime is on `PATH` (the apksigner launcher needs one)
//! - The output directories are usable

use crate::config::{SignConfig, ToolKind};
use crate::process::{command_exists, run_command};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All checks passed
    Healthy,
    /// Some optional checks failed
    Degraded,
    /// Required checks failed
    Unhealthy,
}

impl HealthStatus {
    /// Returns true if status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns true if status is healthy or degraded (still operational)
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,
    /// Status of the check
    pub status: HealthStatus,
    /// Optional message with details
    pub message: Option<String>,
    /// Duration of the check in milliseconds
    pub duration_ms: u64,
    /// Additional details as key-value pairs
    pub details: BTreeMap<String, String>,
}

impl CheckResult {
    /// Create a healthy check result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create an unhealthy check result with a message
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Create a degraded check result with a message
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            duration_ms: 0,
            details: BTreeMap::new(),
        }
    }

    /// Add a detail key-value pair
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Overall health report containing all check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status based on all checks
    pub status: HealthStatus,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Total duration of all checks in milliseconds
    pub total_duration_ms: u64,
    /// Timestamp when the report was generated
    pub timestamp: String,
    /// Version of the tool
    pub version: String,
}

impl HealthReport {
    /// Create a new health report from check results
    #[must_use]
    pub fn new(checks: Vec<CheckResult>, duration: Duration) -> Self {
        let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            checks,
            total_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns true if overall status is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Get all checks that failed (not healthy)
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| !c.status.is_healthy())
            .collect()
    }
}

/// Health checker with configurable checks
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthCheck>>,
}

impl HealthChecker {
    /// Create a new health checker with no checks
    #[must_use]
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a health check
    #[must_use]
    pub fn add_check(mut self, check: impl HealthCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Checks covering everything a pipeline run with `config` needs
    #[must_use]
    pub fn for_config(config: &SignConfig) -> Self {
        let mut checker = Self::new();
        for kind in ToolKind::ALL {
            checker = checker.add_check(ToolPathCheck::new(kind, config.tool_path(kind)));
        }
        checker
            .add_check(CommandCheck::optional("java", Some("-version")))
            .add_check(OutputDirCheck::new("aligned_dir", &config.aligned_dir))
            .add_check(OutputDirCheck::new("signed_dir", &config.signed_dir))
    }

    /// Run all health checks
    #[must_use]
    pub fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut results = Vec::new();

        for check in &self.checks {
            let check_start = Instant::now();
            let mut result = check.check();
            result.duration_ms =
                u64::try_from(check_start.elapsed().as_millis()).unwrap_or(u64::MAX);
            results.push(result);
        }

        HealthReport::new(results, start.elapsed())
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    /// Perform the health check and return a result
    fn check(&self) -> CheckResult;
}

/// A configured tool or keystore path must exist
pub struct ToolPathCheck {
    kind: ToolKind,
    path: PathBuf,
}

impl ToolPathCheck {
    /// Check that `path` (configured for `kind`) exists
    pub fn new(kind: ToolKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl HealthCheck for ToolPathCheck {
    fn check(&self) -> CheckResult {
        let name = self.kind.label();
        let path = self.path.display().to_string();

        if self.path.exists() {
            CheckResult::healthy(name).with_detail("path", path)
        } else {
            CheckResult::unhealthy(name, format!("Not found: {path}")).with_detail("path", path)
        }
    }
}

/// Check if a command is available on `PATH`
pub struct CommandCheck {
    command: String,
    version_arg: Option<String>,
    required: bool,
}

impl CommandCheck {
    /// Create a required command check
    pub fn new(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            command: command.into(),
            version_arg: version_arg.map(String::from),
            required: true,
        }
    }

    /// Create an optional command check (degraded if missing, not unhealthy)
    pub fn optional(command: impl Into<String>, version_arg: Option<&str>) -> Self {
        Self {
            command: command.into(),
            version_arg: version_arg.map(String::from),
            required: false,
        }
    }
}

impl HealthCheck for CommandCheck {
    fn check(&self) -> CheckResult {
        if !command_exists(&self.command) {
            return if self.required {
                CheckResult::unhealthy(&self.command, format!("{} is not installed", self.command))
            } else {
                CheckResult::degraded(
                    &self.command,
                    format!("{} is not installed (optional)", self.command),
                )
            };
        }

        let Some(arg) = &self.version_arg else {
            return CheckResult::healthy(&self.command);
        };

        // `java -version` reports on stderr
        match run_command(&self.command, &[arg]) {
            Ok(output) if output.success => {
                let version = output
                    .combined_output()
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                CheckResult::healthy(&self.command).with_detail("version", version)
            }
            _ => CheckResult::healthy(&self.command),
        }
    }
}

/// An output directory must be writable, or creatable on demand
pub struct OutputDirCheck {
    name: String,
    path: PathBuf,
}

impl OutputDirCheck {
    /// Check `path`, reported under `name`
    pub fn new(name: impl Into<String>, path: &Path) -> Self {
        Self {
            name: name.into(),
            path: path.to_path_buf(),
        }
    }
}

impl HealthCheck for OutputDirCheck {
    fn check(&self) -> CheckResult {
        let path = self.path.display().to_string();

        if !self.path.exists() {
            return CheckResult::degraded(&self.name, "Does not exist yet; created on first run")
                .with_detail("path", path);
        }

        match std::fs::metadata(&self.path) {
            Ok(m) if !m.is_dir() => {
                CheckResult::unhealthy(&self.name, "Not a directory").with_detail("path", path)
            }
            Ok(m) if m.permissions().readonly() => {
                CheckResult::unhealthy(&self.name, "Directory is read-only").with_detail("path", path)
            }
            Ok(_) => CheckResult::healthy(&self.name).with_detail("path", path),
            Err(e) => CheckResult::unhealthy(&self.name, e.to_string()).with_detail("path", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use tempfile::TempDir;

    #[test]
    fn test_command_check_optional() {
        let check = CommandCheck::optional("nonexistent_command_12345", None);
        let result = check.check();
        assert_eq!(result.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_tool_path_check_missing() {
        let result = ToolPathCheck::new(ToolKind::Zipalign, "/no/such/zipalign.exe").check();
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.name, "zipalign tool");
    }

    #[test]
    fn test_output_dir_check_states() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();

        assert_eq!(OutputDirCheck::new("d", dir.path()).check().status, HealthStatus::Healthy);
        assert_eq!(
            OutputDirCheck::new("d", &dir.path().join("later")).check().status,
            HealthStatus::Degraded
        );
        assert_eq!(OutputDirCheck::new("d", &file).check().status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_for_config_flags_missing_tools() {
        let dir = TempDir::new().unwrap();
        let config = SignConfig::debug_defaults(&Layout::new(dir.path()).unwrap());

        let report = HealthChecker::for_config(&config).run();

        assert_eq!(report.status, HealthStatus::Unhealthy);
        let failed: Vec<_> = report.failed_checks().iter().map(|c| c.name.clone()).collect();
        assert!(failed.contains(&"zipalign tool".to_string()));
        assert!(failed.contains(&"apksigner tool".to_string()));
        assert!(failed.contains(&"keystore file".to_string()));
    }

    #[test]
    fn test_health_report_with_failure() {
        let checks = vec![
            CheckResult::healthy("check1"),
            CheckResult::unhealthy("check2", "Failed"),
        ];
        let report = HealthReport::new(checks, Duration::from_millis(100));
        assert!(!report.is_healthy());
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }
}
