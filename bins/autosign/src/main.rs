//! autosign CLI
//!
//! Aligns, signs and verifies Android APKs with the bundled build-tools.

use anyhow::{Context as _, Result};
use autosign_android::{
    PipelineEnv, RunResult, Session, SessionError, SessionEvent, SessionState,
};
use autosign_cli::output::{format_duration, print_line, render_health, stream_for, Status};
use autosign_core::config::{ConfigResolver, Layout, Resolution, Settings, SettingsFile};
use autosign_core::error::exit_codes;
use autosign_core::health::HealthChecker;
use autosign_core::resources::{DirectoryResources, Materialized, ResourceProvider};
use autosign_telemetry::{level_for_verbosity, Event, TelemetryConfig, Timer};
use clap::{Parser, Subcommand};
use owo_colors::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "autosign")]
#[command(about = "Align, sign and verify Android APKs")]
#[command(version)]
struct Cli {
    /// Working root holding config/ and build_product/
    #[arg(long, global = true, env = "AUTOSIGN_ROOT")]
    root: Option<PathBuf>,

    /// Directory with the bundled tools and debug keystore
    #[arg(long, global = true, env = "AUTOSIGN_RESOURCES")]
    resources: Option<PathBuf>,

    /// Settings file path (default: autosign.toml in the root)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align, sign and verify an APK
    Sign {
        /// APK to release
        apk: PathBuf,
        /// Do not open the output directory afterwards
        #[arg(long)]
        no_reveal: bool,
    },

    /// Inspect or regenerate the signing configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether output, errors included, should be JSON
    fn wants_json(&self) -> bool {
        match self {
            Self::Sign { .. } => false,
            Self::Config { action } => matches!(action, ConfigAction::Show { json: true }),
            Self::Doctor { json } => *json,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration, passwords masked
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the properties file location
    Path,
    /// Regenerate debug defaults
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let exit_code = match App::load(&cli) {
        Ok(app) => {
            autosign_telemetry::init_with_config(TelemetryConfig {
                log_level: level_for_verbosity(cli.verbose, cli.quiet, &app.settings.log.level),
                ansi: !cli.no_color,
                ..TelemetryConfig::default()
            })?;
            if let Some(path) = &app.settings_path {
                tracing::debug!(path = %path.display(), "Loaded settings");
            }
            app.run(&cli.command)
                .unwrap_or_else(|e| report(&e, cli.command.wants_json()))
        }
        Err(e) => report(&e, cli.command.wants_json()),
    };

    std::process::exit(exit_code);
}

/// Print an error and pick the process exit code for it.
///
/// With `json`, core errors are printed to stdout as an `ErrorReport`.
fn report(err: &anyhow::Error, json: bool) -> i32 {
    let core = err.downcast_ref::<autosign_core::Error>().or_else(|| {
        match err.downcast_ref::<SessionError>() {
            Some(SessionError::Config(e)) => Some(e),
            _ => None,
        }
    });

    match core {
        Some(e) => {
            match serde_json::to_string_pretty(&e.to_report()) {
                Ok(report) if json => println!("{report}"),
                _ => Status::error(&e.to_string()),
            }
            if e.code.category() == "Configuration" {
                exit_codes::CONFIG_ERROR
            } else {
                exit_codes::FAILURE
            }
        }
        None => {
            Status::error(&format!("{err:#}"));
            exit_codes::FAILURE
        }
    }
}

struct App {
    root: PathBuf,
    settings: Settings,
    settings_path: Option<PathBuf>,
    resources: PathBuf,
    quiet: bool,
}

impl App {
    fn load(cli: &Cli) -> Result<Self> {
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Reading current directory")?,
        };
        let SettingsFile { settings, path } = SettingsFile::load(cli.settings.as_deref(), &root)?;

        // flag or env, then settings, then next to the executable
        let resources = match (&cli.resources, &settings.paths.resources_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => root.join(dir),
            (None, None) => DirectoryResources::beside_executable()?.dir().to_path_buf(),
        };

        Ok(Self {
            root,
            settings,
            settings_path: path,
            resources,
            quiet: cli.quiet,
        })
    }

    fn run(&self, command: &Commands) -> Result<i32> {
        match command {
            Commands::Sign { apk, no_reveal } => self.run_sign(apk, *no_reveal),
            Commands::Config { action } => match action {
                ConfigAction::Show { json } => self.run_config_show(*json),
                ConfigAction::Path => self.run_config_path(),
                ConfigAction::Reset => self.run_config_reset(),
            },
            Commands::Doctor { json } => self.run_doctor(*json),
        }
    }

    fn layout(&self) -> Result<Layout> {
        Ok(Layout::from_settings(&self.root, &self.settings)?)
    }

    fn resolver(&self) -> Result<ConfigResolver> {
        tracing::debug!(dir = %self.resources.display(), "Using bundled resources");
        let provider: Arc<dyn ResourceProvider> = Arc::new(DirectoryResources::new(&self.resources));
        Ok(ConfigResolver::new(self.layout()?, provider))
    }

    fn show(&self, line: &autosign_android::LogLine) {
        if !self.quiet || matches!(stream_for(line.level), Stream::Stderr) {
            print_line(line);
        }
    }

    fn run_sign(&self, apk: &Path, no_reveal: bool) -> Result<i32> {
        let reveal = self.settings.pipeline.reveal && !no_reveal;
        let mut session = Session::new(self.resolver()?, PipelineEnv::system(reveal))?;
        for line in session.log() {
            self.show(line);
        }

        session.select_file(apk)?;
        if let Some(line) = session.log().last() {
            self.show(line);
        }

        let timer = Timer::start("sign");
        session.sign()?;
        while let Some(event) = session.wait_for_event() {
            if let SessionEvent::Line(line) = event {
                self.show(&line);
            }
        }
        let elapsed = timer.stop();

        let result = match session.state() {
            SessionState::Completed { result, .. } => *result,
            _ => RunResult::Failure,
        };
        Event::new(
            "sign",
            serde_json::json!({
                "apk": apk.display().to_string(),
                "result": result,
                "duration_ms": u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            }),
        )
        .log();

        if result == RunResult::Success {
            if !self.quiet {
                Status::info(&format!("Finished in {}", format_duration(elapsed)));
            }
            Ok(exit_codes::SUCCESS)
        } else {
            Ok(exit_codes::FAILURE)
        }
    }

    fn run_config_show(&self, json: bool) -> Result<i32> {
        let resolver = self.resolver()?;
        let resolution = resolver.resolve()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&resolution.config)?);
            return Ok(exit_codes::SUCCESS);
        }

        self.announce(&resolver, &resolution);

        Status::header("Signing configuration");
        println!("source: {}", resolver.layout().properties_file().display());
        if let serde_json::Value::Object(fields) = serde_json::to_value(&resolution.config)? {
            for (key, value) in fields {
                match value {
                    serde_json::Value::String(s) => println!("{key}: {s}"),
                    other => println!("{key}: {other}"),
                }
            }
        }
        Ok(exit_codes::SUCCESS)
    }

    fn run_config_path(&self) -> Result<i32> {
        println!("{}", self.layout()?.properties_file().display());
        Ok(exit_codes::SUCCESS)
    }

    fn run_config_reset(&self) -> Result<i32> {
        let resolver = self.resolver()?;
        let resolution = resolver.reset()?;
        self.announce(&resolver, &resolution);
        Ok(exit_codes::SUCCESS)
    }

    fn run_doctor(&self, json: bool) -> Result<i32> {
        let resolver = self.resolver()?;
        let resolution = resolver.resolve()?;
        let report = HealthChecker::for_config(&resolution.config).run();

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            Status::header("Environment Check");
            println!("{}", render_health(&report));
        }

        if report.status.is_operational() {
            Ok(exit_codes::SUCCESS)
        } else {
            Ok(exit_codes::FAILURE)
        }
    }

    /// Report what a resolution created, unless quiet
    fn announce(&self, resolver: &ConfigResolver, resolution: &Resolution) {
        for (name, outcome) in &resolution.materialized {
            if let Materialized::Failed(reason) = outcome {
                Status::warning(&format!("Could not copy {name}: {reason}"));
            }
        }
        if self.quiet {
            return;
        }
        for name in resolution.copied() {
            Status::info(&format!("Copied bundled {name}"));
        }
        if resolution.created_defaults {
            Status::success(&format!(
                "Generated default configuration: {}",
                resolver.layout().properties_file().display()
            ));
        }
    }
}
