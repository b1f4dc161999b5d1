//! Test doubles shared by the pipeline and session tests

use autosign_core::config::{ConfigResolver, Layout, SignConfig};
use autosign_core::error::{Error, Result};
use autosign_core::process::CommandRunner;
use autosign_core::resources::{self, EmbeddedResources};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One scripted reaction of [`ScriptedRunner`]
#[derive(Debug, Clone)]
pub enum Reply {
    Exit(i32),
    SpawnError(&'static str),
}

/// Records every invocation and answers from a script.
///
/// Successful `zipalign` and `apksigner sign` calls create their output file
/// the way the real tools would. An exhausted script answers exit code 0.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(PathBuf, Vec<OsString>)>>,
}

impl ScriptedRunner {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn exits(codes: &[i32]) -> Arc<Self> {
        Self::new(codes.iter().copied().map(Reply::Exit))
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<OsString>)> {
        self.calls.lock().unwrap().clone()
    }

    /// First argument of every call (`sign`, `verify`, or `-f` for zipalign)
    pub fn verbs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|(_, args)| args[0].to_string_lossy().into_owned())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run_streaming(&self, program: &Path, args: &[OsString]) -> Result<i32> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));

        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Exit(0));
        match reply {
            Reply::SpawnError(msg) => Err(Error::process(msg)),
            Reply::Exit(code) => {
                if code == 0 {
                    if let Some(output) = produced_file(args) {
                        std::fs::write(output, b"apk")?;
                    }
                }
                Ok(code)
            }
        }
    }
}

fn produced_file(args: &[OsString]) -> Option<PathBuf> {
    match args.first()?.to_str()? {
        "-f" => args.last().map(PathBuf::from),
        "sign" => args
            .iter()
            .position(|a| a == "--out")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from),
        _ => None,
    }
}

/// Every bundled resource, as placeholder bytes
pub fn full_bundle() -> EmbeddedResources {
    resources::BUNDLED
        .into_iter()
        .fold(EmbeddedResources::new(), |bundle, name| bundle.with(name, b"bundled"))
}

/// A working root whose tools all exist, plus an input APK
pub struct Workspace {
    pub dir: TempDir,
    pub resolver: ConfigResolver,
    pub config: SignConfig,
    pub apk: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(Layout::new(dir.path()).unwrap(), Arc::new(full_bundle()));
        let config = resolver.resolve().unwrap().config;
        let apk = dir.path().join("app.apk");
        std::fs::write(&apk, b"unsigned").unwrap();
        Self {
            dir,
            resolver,
            config,
            apk,
        }
    }
}
