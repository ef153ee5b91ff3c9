//! Script invocation and process spawning
//!
//! | kind | program | arguments |
//! |---|---|---|
//! | AppleScript | AppleScript interpreter | script path, target path |
//! | ShellScript | shell | script path, target path |
//! | Executable | the script itself | target path |
//!
//! The target path is always the final argument.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use crate::config::Config;
use crate::error::{FinderMenuError, Result};
use crate::logging;
use crate::scripts::{ScriptDescriptor, ScriptKind};

/// Programs used for the interpreted script kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    pub apple_script: PathBuf,
    pub shell: PathBuf,
}

impl Interpreters {
    /// Resolve the configured interpreters, looking bare names up on PATH
    pub fn from_config(config: &Config) -> Self {
        Self {
            apple_script: resolve_program(config.get_apple_script_interpreter()),
            shell: resolve_program(config.get_shell()),
        }
    }
}

impl Default for Interpreters {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Turn a configured program into a path.
///
/// Anything containing a path separator is used as-is. A bare name is looked
/// up on PATH and kept unchanged if the lookup fails, so the spawn error is
/// reported at launch time.
pub fn resolve_program(name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    match which::which(name) {
        Ok(path) => {
            debug!(name, path = %path.display(), "Resolved program on PATH");
            path
        }
        Err(e) => {
            warn!(name, error = %e, "Program not found on PATH");
            candidate.to_path_buf()
        }
    }
}

/// A concrete program and argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Build the invocation for running `script` against `target`
    pub fn for_script(script: &ScriptDescriptor, target: &Path, interpreters: &Interpreters) -> Self {
        match script.kind {
            ScriptKind::AppleScript => Self {
                program: interpreters.apple_script.clone(),
                args: vec![script.path.clone().into(), target.into()],
            },
            ScriptKind::ShellScript => Self {
                program: interpreters.shell.clone(),
                args: vec![script.path.clone().into(), target.into()],
            },
            ScriptKind::Executable => Self {
                program: script.path.clone(),
                args: vec![target.into()],
            },
        }
    }
}

/// Launches an invocation without waiting for it.
///
/// Implementations return the child's pid once it is running.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, invocation: &Invocation, label: &str) -> Result<u32>;
}

/// Spawns real child processes and logs their exit from a waiter thread
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, invocation: &Invocation, label: &str) -> Result<u32> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());

        // Own process group: signals aimed at the daemon don't reach scripts
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| FinderMenuError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let pid = child.id();
        let started = Instant::now();
        let label = label.to_string();

        let waiter = std::thread::Builder::new()
            .name(format!("script-wait-{}", pid))
            .spawn(move || match child.wait() {
                Ok(status) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    info!(pid, status = %status, "Script terminated");
                    logging::log_script_event(&label, "exited", Some(duration_ms), status.success());
                }
                Err(e) => {
                    error!(pid, error = %e, "Failed to wait for script process");
                }
            });

        if let Err(e) = waiter {
            // The child keeps running; only its exit status goes unlogged
            warn!(pid, error = %e, "Failed to start waiter thread");
        }

        Ok(pid)
    }
}

/// Runs scripts against target folders, fire-and-forget
pub struct ScriptRunner {
    interpreters: Interpreters,
    spawner: Box<dyn ProcessSpawner>,
}

impl ScriptRunner {
    pub fn new(interpreters: Interpreters, spawner: Box<dyn ProcessSpawner>) -> Self {
        Self {
            interpreters,
            spawner,
        }
    }

    /// Runner that launches real processes
    pub fn system(interpreters: Interpreters) -> Self {
        Self::new(interpreters, Box::new(SystemSpawner))
    }

    /// Launch `script` against `target` and return immediately.
    ///
    /// Launch failures are logged and absorbed. Returns the pid when a child
    /// was started.
    #[instrument(skip_all, fields(script = %script.title, id = script.id))]
    pub fn run(&self, script: &ScriptDescriptor, target: &Path) -> Option<u32> {
        let invocation = Invocation::for_script(script, target, &self.interpreters);
        info!(
            kind = script.kind.label(),
            program = %invocation.program.display(),
            target = %target.display(),
            "Running script"
        );

        match self.spawner.spawn(&invocation, &script.title) {
            Ok(pid) => {
                logging::log_script_event(&script.title, "started", None, true);
                debug!(pid, "Script process spawned");
                Some(pid)
            }
            Err(e) => {
                error!(error = %e, "Failed to run the process");
                logging::log_script_event(&script.title, "failed", None, false);
                None
            }
        }
    }
}
