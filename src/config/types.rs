//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults::*;

/// User configuration shared by the daemon and the menu provider.
///
/// Every field is optional; accessors fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory scanned for scripts (default: ~/.findermenu)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<String>,
    /// Directory holding the notification bus sockets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_dir: Option<String>,
    /// Directory for JSONL log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
    /// Program used to run AppleScript entries (default: /usr/bin/osascript)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_script_interpreter: Option<String>,
    /// Program used to run shell script entries (default: /bin/bash)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Capacity of each process's event inbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox_capacity: Option<usize>,
}

impl Config {
    /// Returns the scripts directory, or ~/.findermenu if not configured
    pub fn get_scripts_dir(&self) -> PathBuf {
        match &self.scripts_dir {
            Some(dir) => expand_path(dir),
            None => home_dir().join(DEFAULT_SCRIPTS_DIR_NAME),
        }
    }

    /// Returns the bus directory.
    ///
    /// Defaults to the per-user runtime dir, falling back to the cache dir.
    pub fn get_bus_dir(&self) -> PathBuf {
        match &self.bus_dir {
            Some(dir) => expand_path(dir),
            None => dirs::runtime_dir()
                .or_else(dirs::cache_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME)
                .join("bus"),
        }
    }

    /// Returns the log directory, or `<cache_dir>/findermenu/logs` if not configured
    pub fn get_log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => expand_path(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR_NAME)
                .join("logs"),
        }
    }

    /// Returns the AppleScript interpreter, or DEFAULT_APPLESCRIPT_INTERPRETER
    pub fn get_apple_script_interpreter(&self) -> &str {
        self.apple_script_interpreter
            .as_deref()
            .unwrap_or(DEFAULT_APPLESCRIPT_INTERPRETER)
    }

    /// Returns the shell, or DEFAULT_SHELL
    pub fn get_shell(&self) -> &str {
        self.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    /// Returns the inbox capacity, or DEFAULT_INBOX_CAPACITY. Never zero.
    pub fn get_inbox_capacity(&self) -> usize {
        self.inbox_capacity
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_INBOX_CAPACITY)
    }
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| home_dir().join(".config"))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

fn expand_path(raw: &str) -> PathBuf {
    Path::new(shellexpand::tilde(raw).as_ref()).to_path_buf()
}
