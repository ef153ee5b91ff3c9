use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

/// How loudly a failure should be reported in the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Warning, // recoverable, message or entry dropped
    Error,   // operation failed
}

/// Domain-specific errors for the finder menu processes
#[derive(Error, Debug)]
pub enum FinderMenuError {
    #[error("Failed to decode {channel} payload: {source}")]
    Decode {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {channel} payload: {source}")]
    Encode {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Notification on {channel} carried no payload")]
    MissingPayload { channel: &'static str },

    #[error("Notification bus error on '{channel}': {source}")]
    Bus {
        channel: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error in '{path}': {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FinderMenuError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Decode { .. } => ErrorSeverity::Warning,
            Self::Encode { .. } => ErrorSeverity::Error,
            Self::MissingPayload { .. } => ErrorSeverity::Warning,
            Self::Bus { .. } => ErrorSeverity::Warning,
            Self::Spawn { .. } => ErrorSeverity::Error,
            Self::Config { .. } => ErrorSeverity::Warning,
            Self::Io(_) => ErrorSeverity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderMenuError>;

/// Log a domain error at the level its `severity()` calls for, then drop it.
///
/// Every failure stays local to the process that hit it; nothing is sent
/// back over the bus.
pub trait ReportExt<T> {
    fn report(self) -> Option<T>;
}

impl<T> ReportExt<T> for Result<T> {
    #[track_caller]
    fn report(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                match err.severity() {
                    ErrorSeverity::Warning => warn!(
                        error = %err,
                        file = caller.file(),
                        line = caller.line(),
                        "Dropped after recoverable failure"
                    ),
                    ErrorSeverity::Error => error!(
                        error = %err,
                        file = caller.file(),
                        line = caller.line(),
                        "Operation failed"
                    ),
                }
                None
            }
        }
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use for foreign errors (I/O and the like) when the operation is recoverable
/// and the peer process doesn't need to know. Domain errors use `ReportExt`.
///
/// # Examples
///
/// ```ignore
/// use findermenu::error::ResultExt;
///
/// // Drop the click if the target can't be made absolute
/// let target = std::path::absolute(target).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = %err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = %err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
