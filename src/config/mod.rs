//! Configuration module - user settings for both processes
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - The `Config` struct and its accessors
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_APPLESCRIPT_INTERPRETER, DEFAULT_INBOX_CAPACITY, DEFAULT_SHELL};
pub use loader::{load_config, read_config};
pub use types::{default_config_path, Config};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
