//! Script execution module
//!
//! Maps a script descriptor and a target folder to a concrete program
//! invocation and launches it as a detached child process. Completion is
//! observed only for logging.

mod runner;

pub use runner::{
    resolve_program, Interpreters, Invocation, ProcessSpawner, ScriptRunner, SystemSpawner,
};

#[cfg(test)]
#[path = "../executor_tests.rs"]
mod tests;
