//! Configuration loading from the file system

use std::path::Path;
use tracing::{info, instrument};

use super::types::Config;
use crate::error::{FinderMenuError, ReportExt, Result};

/// Read and parse a JSON config file.
///
/// `Ok(None)` means the file does not exist. A file that exists but cannot be
/// read or parsed is an error.
pub fn read_config(config_path: &Path) -> Result<Option<Config>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| FinderMenuError::Config {
        path: config_path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str::<Config>(&contents)
        .map(Some)
        .map_err(|e| FinderMenuError::Config {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load configuration from a JSON file.
///
/// Returns Config::default() if the file is missing, unreadable or malformed.
/// Configuration problems never stop either process from starting.
#[instrument(name = "load_config", skip_all, fields(path = %config_path.display()))]
pub fn load_config(config_path: &Path) -> Config {
    match read_config(config_path).report() {
        Some(Some(config)) => {
            info!("Successfully loaded config");
            config
        }
        Some(None) => {
            info!("Config file not found, using defaults");
            Config::default()
        }
        None => Config::default(),
    }
}
