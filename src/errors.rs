//! Error types for the health monitor

use std::fmt;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug)]
pub enum MonitorError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP client construction failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Io(err) => write!(f, "IO error: {}", err),
            MonitorError::Http(err) => write!(f, "HTTP error: {}", err),
            MonitorError::Json(err) => write!(f, "JSON error: {}", err),
            MonitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MonitorError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Io(err) => Some(err),
            MonitorError::Http(err) => Some(err),
            MonitorError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::Io(err)
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Http(err)
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Json(err)
    }
}

/// Classified outcome of a single failed check. Every variant is caught at
/// the per-check boundary and rendered into a `CheckResult` detail string;
/// none of these ever propagate out of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckFailure {
    /// Target unreachable (DNS failure, connection refused, reset)
    Connection(String),

    /// No response within the check's timeout ceiling
    Timeout(Duration),

    /// Response received but with a non-2xx status
    Protocol(u16),

    /// 2xx response whose body failed the target's content assertion
    ContentAssertion(String),

    /// Process enumeration not possible in this environment
    ResourceUnavailable(String),
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Connection(cause) => write!(f, "target unreachable: {}", cause),
            CheckFailure::Timeout(limit) => {
                write!(f, "no response within {}s", limit.as_secs())
            }
            CheckFailure::Protocol(status) => write!(f, "HTTP {}", status),
            CheckFailure::ContentAssertion(what) => {
                write!(f, "content assertion failed: {}", what)
            }
            CheckFailure::ResourceUnavailable(why) => {
                write!(f, "resource probe unavailable: {}", why)
            }
        }
    }
}
