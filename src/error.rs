//! Error types for mediaflow.
//!
//! Two layers: [`MediaflowError`] for library operations (config, EDL I/O,
//! transcript loading) and [`ToolError`] for failures raised inside a tool,
//! which carry the [`ErrorKind`] the supervisor uses to pick a recovery path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library-level error type for mediaflow operations.
#[derive(Error, Debug)]
pub enum MediaflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("EDL error: {0}")]
    Edl(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for mediaflow operations.
pub type Result<T> = std::result::Result<T, MediaflowError>;

/// Failure classes that drive the supervisor's recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad input attributable to the caller. Never retried.
    Validation,
    /// Transient failure (timeout, rate limit, flaky I/O). Retried with backoff.
    Recoverable,
    /// Memory, CPU or disk exhaustion. Triggers a quality tier step-down.
    Resource,
    /// Unexpected or unclassifiable. Surfaced immediately.
    Fatal,
    /// The caller's execution context was cancelled between attempts.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Recoverable => write!(f, "recoverable"),
            ErrorKind::Resource => write!(f, "resource"),
            ErrorKind::Fatal => write!(f, "fatal"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A classified failure raised by a tool.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Recoverable, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }
}

// ENOSPC on Linux and macOS.
const STORAGE_FULL_OS_ERROR: i32 = 28;

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;

        let kind = match err.kind() {
            Io::TimedOut
            | Io::Interrupted
            | Io::WouldBlock
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::BrokenPipe => ErrorKind::Recoverable,
            Io::OutOfMemory => ErrorKind::Resource,
            Io::NotFound | Io::InvalidInput | Io::InvalidData => ErrorKind::Validation,
            _ if err.raw_os_error() == Some(STORAGE_FULL_OS_ERROR) => ErrorKind::Resource,
            _ => ErrorKind::Fatal,
        };

        ToolError::new(kind, err.to_string())
    }
}

impl From<MediaflowError> for ToolError {
    fn from(err: MediaflowError) -> Self {
        match err {
            MediaflowError::Io(io) => io.into(),
            MediaflowError::Json(e) => ToolError::validation(e.to_string()),
            MediaflowError::Transcript(msg)
            | MediaflowError::InvalidInput(msg)
            | MediaflowError::Workflow(msg) => ToolError::validation(msg),
            other => ToolError::fatal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_classification() {
        let timeout: ToolError = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(timeout.kind, ErrorKind::Recoverable);

        let missing: ToolError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(missing.kind, ErrorKind::Validation);

        let oom: ToolError = io::Error::new(io::ErrorKind::OutOfMemory, "oom").into();
        assert_eq!(oom.kind, ErrorKind::Resource);

        let disk_full: ToolError = io::Error::from_raw_os_error(STORAGE_FULL_OS_ERROR).into();
        assert_eq!(disk_full.kind, ErrorKind::Resource);

        let denied: ToolError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(denied.kind, ErrorKind::Fatal);
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::recoverable("rate limited");
        assert_eq!(err.to_string(), "recoverable error: rate limited");
    }
}
