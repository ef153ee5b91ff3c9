//! Structured JSONL logging plus human-readable stderr output.
//!
//! Both processes log through `tracing`. `init` wires two layers:
//! - **JSONL to file** (`<log_dir>/<process>.jsonl`) for later inspection
//! - **Compact to stderr** for whoever launched the process
//!
//! # Usage
//!
//! ```rust,ignore
//! use findermenu::logging;
//!
//! // MUST keep the guard alive for the duration of the program
//! let _guard = logging::init("findermenu-daemon", &log_dir);
//!
//! tracing::info!(event_type = "daemon_lifecycle", "Daemon started");
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system for one process.
///
/// Failing to create the log file is not fatal: the process keeps logging
/// to stderr only.
pub fn init(process_name: &str, log_dir: &Path) -> LoggingGuard {
    let log_path = log_file_path(log_dir, process_name);

    let file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let (json_layer, file_guard) = match file {
        Ok(file) => {
            // Non-blocking so a slow disk never stalls a bus callback
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "[LOGGING] Failed to open log file {}: {}",
                log_path.display(),
                e
            );
            (None, None)
        }
    };

    // try_init: a second init in the same process (tests) is a no-op
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        process = process_name,
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Path of the JSONL log file for a process
pub fn log_file_path(log_dir: &Path, process_name: &str) -> PathBuf {
    log_dir.join(format!("{}.jsonl", process_name))
}

/// Category-tagged log line.
///
/// Prefer tracing macros directly when there are structured fields to attach.
pub fn log(category: &str, message: &str) {
    tracing::info!(category = category, "{}", message);
}

/// Log a script lifecycle event with structured fields
pub fn log_script_event(script: &str, action: &str, duration_ms: Option<u64>, success: bool) {
    match duration_ms {
        Some(duration) => {
            tracing::info!(
                event_type = "script_event",
                script = script,
                action = action,
                duration_ms = duration,
                success = success,
                "Script {} {}", action, script
            );
        }
        None => {
            tracing::info!(
                event_type = "script_event",
                script = script,
                action = action,
                success = success,
                "Script {} {}", action, script
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_uses_process_name() {
        let path = log_file_path(Path::new("/tmp/logs"), "findermenu-daemon");
        assert_eq!(path, PathBuf::from("/tmp/logs/findermenu-daemon.jsonl"));
    }

    #[test]
    fn test_init_creates_log_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");

        let _guard = init("findermenu-test", &log_dir);

        assert!(log_dir.is_dir());
        assert!(log_file_path(&log_dir, "findermenu-test").exists());
    }
}
