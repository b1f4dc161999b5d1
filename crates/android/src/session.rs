//! Signing session state machine
//!
//! A [`Session`] owns the resolved configuration, the selected APK and the
//! accumulated log. Runs execute on a single background worker; lines and the
//! terminal outcome travel back over a channel and are applied on the owning
//! thread by [`Session::pump`] or [`Session::wait_for_event`].
//!
//! ```text
//! Idle --select--> FileSelected --sign--> Running --finish--> Completed
//!                       ^                                        |
//!                       +---------------- select ----------------+
//! ```

use crate::log::{LogLine, LogSink};
use crate::pipeline::{run_pipeline, PipelineEnv, PipelineOutcome};
use autosign_core::config::{ConfigResolver, Resolution, SignConfig};
use autosign_core::resources::Materialized;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Terminal result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    Success,
    Failure,
}

impl From<&PipelineOutcome> for RunResult {
    fn from(outcome: &PipelineOutcome) -> Self {
        if outcome.is_signed() {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FileSelected(PathBuf),
    Running(PathBuf),
    Completed { apk: PathBuf, result: RunResult },
}

impl SessionState {
    /// The APK this state refers to, if any
    #[must_use]
    pub fn apk(&self) -> Option<&Path> {
        match self {
            Self::Idle => None,
            Self::FileSelected(apk) | Self::Running(apk) | Self::Completed { apk, .. } => {
                Some(apk)
            }
        }
    }
}

/// Published by the worker while a run progresses
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Line(LogLine),
    Finished(PipelineOutcome),
}

/// Rejected session actions
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("a signing run is already in progress")]
    Busy,

    #[error("no APK selected")]
    NoFileSelected,

    #[error(transparent)]
    Config(#[from] autosign_core::Error),

    #[error("failed to start signing worker: {0}")]
    Spawn(#[source] std::io::Error),
}

struct ChannelSink {
    tx: Sender<SessionEvent>,
}

impl LogSink for ChannelSink {
    fn emit(&mut self, line: LogLine) {
        // receiver gone means the session was dropped mid-run
        let _ = self.tx.send(SessionEvent::Line(line));
    }
}

/// Interactive signing session
pub struct Session {
    resolver: ConfigResolver,
    config: SignConfig,
    env: PipelineEnv,
    state: SessionState,
    log: Vec<LogLine>,
    events: Option<Receiver<SessionEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Resolve the configuration and start in [`SessionState::Idle`]
    pub fn new(resolver: ConfigResolver, env: PipelineEnv) -> Result<Self, SessionError> {
        let resolution = resolver.resolve()?;
        let mut session = Self::with_config(resolver, resolution.config.clone(), env);
        session.record_resolution(&resolution);
        Ok(session)
    }

    /// Start from an already resolved configuration
    #[must_use]
    pub fn with_config(resolver: ConfigResolver, config: SignConfig, env: PipelineEnv) -> Self {
        Self {
            resolver,
            config,
            env,
            state: SessionState::Idle,
            log: Vec::new(),
            events: None,
            worker: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Every line produced so far, oldest first
    #[must_use]
    pub fn log(&self) -> &[LogLine] {
        &self.log
    }

    #[must_use]
    pub fn config(&self) -> &SignConfig {
        &self.config
    }

    #[must_use]
    pub fn selected_file(&self) -> Option<&Path> {
        self.state.apk()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running(_))
    }

    /// Choose the APK for the next run
    pub fn select_file(&mut self, apk: impl Into<PathBuf>) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::Busy);
        }
        let apk = apk.into();
        let name = apk
            .file_name()
            .map_or_else(|| apk.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.push(LogLine::info(format!("Selected: {name}")));
        self.state = SessionState::FileSelected(apk);
        Ok(())
    }

    /// Start a run for the selected APK on a background worker
    pub fn sign(&mut self) -> Result<(), SessionError> {
        let apk = match &self.state {
            SessionState::Idle => return Err(SessionError::NoFileSelected),
            SessionState::Running(_) => return Err(SessionError::Busy),
            SessionState::FileSelected(apk) | SessionState::Completed { apk, .. } => apk.clone(),
        };

        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();
        let env = self.env.clone();
        let input = apk.clone();

        let worker = thread::Builder::new()
            .name("autosign-pipeline".into())
            .spawn(move || {
                let mut sink = ChannelSink { tx };
                let outcome = run_pipeline(Some(&input), &config, &env, &mut sink);
                let _ = sink.tx.send(SessionEvent::Finished(outcome));
            })
            .map_err(SessionError::Spawn)?;

        tracing::debug!(apk = %apk.display(), "Signing run started");
        self.events = Some(rx);
        self.worker = Some(worker);
        self.state = SessionState::Running(apk);
        Ok(())
    }

    /// Clear selection and log, and reload the configuration from disk
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::Busy);
        }
        let resolution = self.resolver.resolve()?;
        self.config = resolution.config.clone();
        self.log.clear();
        self.state = SessionState::Idle;
        self.record_resolution(&resolution);
        Ok(())
    }

    /// Apply every event published so far without blocking.
    ///
    /// Returns the lines appended by this call.
    pub fn pump(&mut self) -> Vec<LogLine> {
        let mut fresh = Vec::new();
        while let Some(rx) = &self.events {
            match rx.try_recv() {
                Ok(event) => {
                    if let SessionEvent::Line(line) = self.apply(event) {
                        fresh.push(line);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => fresh.push(self.worker_lost()),
            }
        }
        fresh
    }

    /// Block for the next event of the current run and apply it.
    ///
    /// Returns `None` once no run is in progress.
    pub fn wait_for_event(&mut self) -> Option<SessionEvent> {
        let rx = self.events.as_ref()?;
        match rx.recv() {
            Ok(event) => Some(self.apply(event)),
            Err(RecvError) => Some(SessionEvent::Line(self.worker_lost())),
        }
    }

    /// Block until the current run finishes; returns the lines it appended
    pub fn wait(&mut self) -> Vec<LogLine> {
        let mut fresh = Vec::new();
        while let Some(event) = self.wait_for_event() {
            if let SessionEvent::Line(line) = event {
                fresh.push(line);
            }
        }
        fresh
    }

    fn apply(&mut self, event: SessionEvent) -> SessionEvent {
        match &event {
            SessionEvent::Line(line) => self.log.push(line.clone()),
            SessionEvent::Finished(outcome) => self.finish(RunResult::from(outcome)),
        }
        event
    }

    fn worker_lost(&mut self) -> LogLine {
        let line = LogLine::error("Unexpected error: signing worker stopped");
        self.push(line.clone());
        self.finish(RunResult::Failure);
        line
    }

    fn finish(&mut self, result: RunResult) {
        self.events = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::debug!("Signing worker panicked");
            }
        }
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = match state {
            SessionState::Running(apk) => SessionState::Completed { apk, result },
            other => other,
        };
        tracing::debug!(?result, "Signing run finished");
    }

    fn push(&mut self, line: LogLine) {
        line.trace();
        self.log.push(line);
    }

    fn record_resolution(&mut self, resolution: &Resolution) {
        for (name, outcome) in &resolution.materialized {
            match outcome {
                Materialized::Copied { .. } => {
                    self.push(LogLine::info(format!("Copied bundled {name}")));
                }
                Materialized::Failed(reason) => {
                    self.push(LogLine::warning(format!("Could not copy {name}: {reason}")));
                }
                Materialized::AlreadyPresent | Materialized::Unavailable => {}
            }
        }
        if resolution.created_defaults {
            self.push(LogLine::info(format!(
                "Generated default configuration: {}",
                self.resolver.layout().properties_file().display()
            )));
        }
    }
}
