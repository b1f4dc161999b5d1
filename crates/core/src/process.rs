//! Process execution utilities
//!
//! Provides a unified interface for running external commands with:
//! - Output capture
//! - Streaming output (stdio inherited from the host console)
//! - A [`CommandRunner`] seam so callers can substitute a scripted runner

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Result of a captured command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from `std::process::Output`
    #[must_use]
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Get combined output (stdout + stderr)
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external programs to completion, forwarding their output to the console.
///
/// Implementations block until the child exits and return its exit code
/// (`-1` when the process was terminated by a signal).
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, inheriting stdio, and wait for it to exit
    fn run_streaming(&self, program: &Path, args: &[OsString]) -> Result<i32>;
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run_streaming(&self, program: &Path, args: &[OsString]) -> Result<i32> {
        run_command_streaming(program, args)
    }
}

/// Run a command and capture output
pub fn run_command(program: impl AsRef<OsStr>, args: &[&str]) -> Result<CommandResult> {
    let program = program.as_ref();
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            Error::process(format!(
                "Failed to execute {}: {}",
                program.to_string_lossy(),
                e
            ))
            .with_source(e)
        })?;

    Ok(CommandResult::from_output(output))
}

/// Run a command and stream output to stdout/stderr
pub fn run_command_streaming<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> Result<i32> {
    tracing::debug!(
        program = %program.display(),
        args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
        "spawning"
    );

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| {
            Error::process(format!("Failed to execute {}: {}", program.display(), e))
                .with_source(e)
        })?;

    let code = status.code().unwrap_or(-1);
    tracing::debug!(program = %program.display(), code, "exited");
    Ok(code)
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}
