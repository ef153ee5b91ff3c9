//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Scripts directory, relative to the user's home directory
pub const DEFAULT_SCRIPTS_DIR_NAME: &str = ".findermenu";

/// AppleScript interpreter used for `scpt`, `scptd` and `applescript` entries
pub const DEFAULT_APPLESCRIPT_INTERPRETER: &str = "/usr/bin/osascript";

/// Shell used for `sh` entries
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Event loop inbox capacity. Notifications beyond this are dropped.
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

/// Directory name used under the platform config, cache and runtime dirs
pub const APP_DIR_NAME: &str = "findermenu";

/// Config file name inside `<config_dir>/findermenu/`
pub const CONFIG_FILE_NAME: &str = "config.json";
