//! Terminal output utilities
//!
//! Colors go through `if_supports_color`, so they disappear when the stream
//! is not a terminal or when `owo_colors::set_override(false)` is in effect.

use autosign_android::{LogLevel, LogLine};
use autosign_core::health::{CheckResult, HealthReport, HealthStatus};
use owo_colors::{OwoColorize, Stream};

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |t| t.blue()), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Stream a pipeline line belongs on; problems go to stderr
#[must_use]
pub fn stream_for(level: LogLevel) -> Stream {
    match level {
        LogLevel::Warning | LogLevel::Error => Stream::Stderr,
        LogLevel::Info | LogLevel::Step | LogLevel::Success => Stream::Stdout,
    }
}

fn marker(level: LogLevel, stream: Stream) -> String {
    match level {
        LogLevel::Info => "ℹ".if_supports_color(stream, |t| t.blue()).to_string(),
        LogLevel::Step => "→".if_supports_color(stream, |t| t.cyan()).to_string(),
        LogLevel::Success => "✓".if_supports_color(stream, |t| t.green()).to_string(),
        LogLevel::Warning => "⚠".if_supports_color(stream, |t| t.yellow()).to_string(),
        LogLevel::Error => "✗".if_supports_color(stream, |t| t.red()).to_string(),
    }
}

/// Format one pipeline line as `HH:MM:SS <marker> <message>`
#[must_use]
pub fn render_line(line: &LogLine) -> String {
    let stream = stream_for(line.level);
    let time = line.at.format("%H:%M:%S").to_string();
    format!(
        "{} {} {}",
        time.if_supports_color(stream, |t| t.dimmed()),
        marker(line.level, stream),
        line.message
    )
}

/// Print one pipeline line on its stream
pub fn print_line(line: &LogLine) {
    match stream_for(line.level) {
        Stream::Stderr => eprintln!("{}", render_line(line)),
        _ => println!("{}", render_line(line)),
    }
}

fn check_marker(status: HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "✓".if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        HealthStatus::Degraded => "⚠".if_supports_color(Stream::Stdout, |t| t.yellow()).to_string(),
        HealthStatus::Unhealthy => "✗".if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
    }
}

fn render_check(check: &CheckResult) -> String {
    let mut out = format!("{} {}", check_marker(check.status), check.name);
    if let Some(message) = &check.message {
        out.push_str(": ");
        out.push_str(message);
    }
    for (key, value) in &check.details {
        out.push_str(&format!("\n    {key}: {value}"));
    }
    out
}

/// Format a health report, one block per check plus a summary line
#[must_use]
pub fn render_health(report: &HealthReport) -> String {
    let mut lines: Vec<String> = report.checks.iter().map(render_check).collect();
    let failed = report.failed_checks().len();
    lines.push(String::new());
    lines.push(if failed == 0 {
        format!("All {} passed", format_count(report.checks.len(), "check", "checks"))
    } else {
        format!(
            "{} of {} need attention",
            format_count(failed, "check", "checks"),
            report.checks.len()
        )
    });
    lines.join("\n")
}

/// Format a duration for display
#[must_use]
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
#[must_use]
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
