//! Align, sign and verify an APK
//!
//! Runs three external tools strictly in sequence, stopping at the first hard
//! failure. Every outcome is reported as status lines on a [`LogSink`];
//! nothing escapes as an error.
//!
//! | Step   | Failure handling                      |
//! |--------|---------------------------------------|
//! | Align  | error line, remaining steps skipped   |
//! | Sign   | error line, verify skipped            |
//! | Verify | warning line, signed artifact kept    |

use crate::log::{LogLine, LogSink};
use crate::reveal::{ExplorerReveal, NoReveal, Reveal};
use crate::tools::{align_args, sign_args, verify_args, ArtifactPaths};
use autosign_core::config::SignConfig;
use autosign_core::error::{Error, Result};
use autosign_core::process::{CommandRunner, SystemRunner};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// External collaborators of a run
#[derive(Clone)]
pub struct PipelineEnv {
    pub runner: Arc<dyn CommandRunner>,
    pub reveal: Arc<dyn Reveal>,
}

impl PipelineEnv {
    /// Real processes; reveal the signed APK when `reveal` is set
    #[must_use]
    pub fn system(reveal: bool) -> Self {
        let reveal: Arc<dyn Reveal> = if reveal {
            Arc::new(ExplorerReveal)
        } else {
            Arc::new(NoReveal)
        };
        Self {
            runner: Arc::new(SystemRunner),
            reveal,
        }
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Align,
    Sign,
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Align => "align",
            Self::Sign => "sign",
            Self::Verify => "verify",
        })
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PipelineOutcome {
    /// A precondition failed; no process was spawned
    Rejected,
    /// A step failed or raised an unexpected error
    Failed { step: Step },
    /// A signed artifact was produced
    Signed { signed: PathBuf, verified: bool },
}

impl PipelineOutcome {
    /// Whether a signed artifact was produced
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed { .. })
    }
}

/// Run the full pipeline for `apk` and report progress to `sink`.
///
/// `None` means no file was chosen; the run is rejected with a single line.
pub fn run_pipeline(
    apk: Option<&Path>,
    config: &SignConfig,
    env: &PipelineEnv,
    sink: &mut dyn LogSink,
) -> PipelineOutcome {
    let mut out = Reporter { sink };

    let Some(apk) = apk else {
        out.emit(LogLine::error("Error: no APK selected"));
        return PipelineOutcome::Rejected;
    };

    let missing = config.missing_tools();
    if !missing.is_empty() {
        for (kind, path) in missing {
            out.emit(LogLine::error(format!(
                "Error: {kind} not found, check the configured path: {}",
                path.display()
            )));
        }
        return PipelineOutcome::Rejected;
    }

    let mut step = Step::Align;
    match execute(apk, config, env, &mut out, &mut step) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::debug!(%step, error = ?e, "Pipeline aborted");
            out.emit(LogLine::error(format!("Unexpected error: {}", e.message)));
            PipelineOutcome::Failed { step }
        }
    }
}

struct Reporter<'a> {
    sink: &'a mut dyn LogSink,
}

impl Reporter<'_> {
    fn emit(&mut self, line: LogLine) {
        line.trace();
        self.sink.emit(line);
    }
}

fn execute(
    apk: &Path,
    config: &SignConfig,
    env: &PipelineEnv,
    out: &mut Reporter<'_>,
    step: &mut Step,
) -> Result<PipelineOutcome> {
    let input = std::path::absolute(apk).map_err(Error::from)?;
    let paths = ArtifactPaths::derive(&input, config)?;
    fs::create_dir_all(&config.aligned_dir)?;
    fs::create_dir_all(&config.signed_dir)?;

    out.emit(LogLine::step(format!(
        "Aligning: {} -> {}",
        file_name(&paths.input),
        paths.aligned.display()
    )));
    let code = env
        .runner
        .run_streaming(&config.zipalign_path, &align_args(&paths.input, &paths.aligned))?;
    if code != 0 {
        out.emit(LogLine::error(format!("Alignment failed (exit code {code})")));
        return Ok(PipelineOutcome::Failed { step: Step::Align });
    }
    out.emit(LogLine::success("Alignment complete"));

    *step = Step::Sign;
    out.emit(LogLine::step(format!(
        "Signing: {} -> {}",
        file_name(&paths.aligned),
        paths.signed.display()
    )));
    let code = env.runner.run_streaming(
        &config.apksigner_path,
        &sign_args(config, &paths.aligned, &paths.signed),
    )?;
    if code != 0 {
        out.emit(LogLine::error(format!("Signing failed (exit code {code})")));
        return Ok(PipelineOutcome::Failed { step: Step::Sign });
    }
    out.emit(LogLine::success("Signing complete"));

    *step = Step::Verify;
    out.emit(LogLine::step(format!(
        "Verifying signature: {}",
        file_name(&paths.signed)
    )));
    let code = env
        .runner
        .run_streaming(&config.apksigner_path, &verify_args(&paths.signed))?;
    if code != 0 {
        out.emit(LogLine::warning(format!(
            "Signature verification failed (exit code {code}); signed APK kept at {}",
            paths.signed.display()
        )));
        return Ok(PipelineOutcome::Signed {
            signed: paths.signed,
            verified: false,
        });
    }
    out.emit(LogLine::success(format!(
        "Signature verified: {}",
        paths.signed.display()
    )));

    if env.reveal.reveal(&paths.signed) {
        out.emit(LogLine::info("Opened output directory"));
    }

    Ok(PipelineOutcome::Signed {
        signed: paths.signed,
        verified: true,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogLevel;
    use crate::testing::{Reply, ScriptedRunner, Workspace};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn env(runner: Arc<ScriptedRunner>) -> PipelineEnv {
        PipelineEnv {
            runner,
            reveal: Arc::new(NoReveal),
        }
    }

    fn levels(lines: &[LogLine]) -> Vec<LogLevel> {
        lines.iter().map(|l| l.level).collect()
    }

    #[test]
    fn test_no_apk_emits_one_error_and_spawns_nothing() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::exits(&[]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(None, &ws.config, &env(runner.clone()), &mut lines);

        assert_eq!(outcome, PipelineOutcome::Rejected);
        assert_eq!(levels(&lines), [LogLevel::Error]);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_each_missing_tool_is_reported() {
        let ws = Workspace::new();
        let mut config = ws.config.clone();
        config.zipalign_path = ws.dir.path().join("gone/zipalign.exe");
        config.keystore_path = ws.dir.path().join("gone/release.jks");
        let runner = ScriptedRunner::exits(&[]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &config, &env(runner.clone()), &mut lines);

        assert_eq!(outcome, PipelineOutcome::Rejected);
        assert_eq!(levels(&lines), [LogLevel::Error, LogLevel::Error]);
        assert!(lines[0].message.contains("zipalign tool"));
        assert!(lines[0].message.contains("zipalign.exe"));
        assert!(lines[1].message.contains("keystore file"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_all_missing_reports_three_lines() {
        let ws = Workspace::new();
        let mut config = ws.config.clone();
        config.zipalign_path = PathBuf::from("/nope/z");
        config.apksigner_path = PathBuf::from("/nope/a");
        config.keystore_path = PathBuf::from("/nope/k");
        let runner = ScriptedRunner::exits(&[]);
        let mut lines = Vec::new();

        run_pipeline(Some(&ws.apk), &config, &env(runner.clone()), &mut lines);

        assert_eq!(lines.len(), 3);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_happy_path_runs_three_tools_in_order() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::exits(&[0, 0, 0]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &ws.config, &env(runner.clone()), &mut lines);

        let signed = ws.config.signed_dir.join("app_signed.apk");
        assert_eq!(
            outcome,
            PipelineOutcome::Signed {
                signed: signed.clone(),
                verified: true
            }
        );
        assert_eq!(runner.verbs(), ["-f", "sign", "verify"]);

        let calls = runner.calls();
        assert_eq!(calls[0].0, ws.config.zipalign_path);
        assert_eq!(calls[1].0, ws.config.apksigner_path);
        assert_eq!(
            calls[0].1.last().unwrap(),
            ws.config.aligned_dir.join("app_aligned.apk").as_os_str()
        );
        assert_eq!(calls[2].1.last().unwrap(), signed.as_os_str());
        assert!(signed.exists());

        assert_eq!(
            levels(&lines),
            [
                LogLevel::Step,
                LogLevel::Success,
                LogLevel::Step,
                LogLevel::Success,
                LogLevel::Step,
                LogLevel::Success,
            ]
        );
    }

    #[test]
    fn test_align_failure_skips_sign_and_verify() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::exits(&[1]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &ws.config, &env(runner.clone()), &mut lines);

        assert_eq!(outcome, PipelineOutcome::Failed { step: Step::Align });
        assert_eq!(runner.verbs(), ["-f"]);
        assert_eq!(lines.last().unwrap().level, LogLevel::Error);
    }

    #[test]
    fn test_sign_failure_skips_verify() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::exits(&[0, 2]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &ws.config, &env(runner.clone()), &mut lines);

        assert_eq!(outcome, PipelineOutcome::Failed { step: Step::Sign });
        assert_eq!(runner.verbs(), ["-f", "sign"]);
        assert!(lines.last().unwrap().message.contains("exit code 2"));
    }

    #[test]
    fn test_verify_failure_is_a_warning_and_keeps_artifact() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::exits(&[0, 0, 1]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &ws.config, &env(runner.clone()), &mut lines);

        let signed = ws.config.signed_dir.join("app_signed.apk");
        assert_eq!(
            outcome,
            PipelineOutcome::Signed {
                signed: signed.clone(),
                verified: false
            }
        );
        assert!(signed.exists());
        assert!(lines
            .iter()
            .any(|l| l.level == LogLevel::Success && l.message == "Signing complete"));
        assert_eq!(lines.last().unwrap().level, LogLevel::Warning);
    }

    #[test]
    fn test_spawn_error_becomes_single_generic_line() {
        let ws = Workspace::new();
        let runner = ScriptedRunner::new([Reply::Exit(0), Reply::SpawnError("access denied")]);
        let mut lines = Vec::new();

        let outcome = run_pipeline(Some(&ws.apk), &ws.config, &env(runner.clone()), &mut lines);

        assert_eq!(outcome, PipelineOutcome::Failed { step: Step::Sign });
        let errors: Vec<_> = lines.iter().filter(|l| l.level == LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("access denied"));
        assert_eq!(runner.verbs(), ["-f", "sign"]);
    }

    #[test]
    fn test_output_dirs_created_on_demand() {
        let ws = Workspace::new();
        let mut config = ws.config.clone();
        config.aligned_dir = ws.dir.path().join("fresh/aligned");
        config.signed_dir = ws.dir.path().join("fresh/signed");

        run_pipeline(Some(&ws.apk), &config, &env(ScriptedRunner::exits(&[])), &mut Vec::new());

        assert!(config.aligned_dir.is_dir());
        assert!(config.signed_dir.is_dir());
    }

    #[test]
    fn test_reveal_only_after_successful_verify() {
        #[derive(Default)]
        struct CountingReveal(AtomicUsize);
        impl Reveal for CountingReveal {
            fn reveal(&self, _path: &Path) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst);
                true
            }
        }

        let ws = Workspace::new();
        let reveal = Arc::new(CountingReveal::default());
        let mut env = env(ScriptedRunner::exits(&[0, 0, 1]));
        env.reveal = reveal.clone();

        run_pipeline(Some(&ws.apk), &ws.config, &env, &mut Vec::new());
        assert_eq!(reveal.0.load(Ordering::SeqCst), 0);

        env.runner = ScriptedRunner::exits(&[0, 0, 0]);
        let mut lines = Vec::new();
        run_pipeline(Some(&ws.apk), &ws.config, &env, &mut lines);
        assert_eq!(reveal.0.load(Ordering::SeqCst), 1);
        assert_eq!(lines.last().unwrap().message, "Opened output directory");
    }
}
