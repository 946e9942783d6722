//! Line-oriented event log sink
//!
//! Emits `[<ISO8601>] <LEVEL>: <message>` lines to stdout and, when
//! configured, appends them to a log file. The sink handle is acquired
//! once at startup and dropped on shutdown; every line is also mirrored
//! into `tracing` at the matching level.

use crate::checks::{CheckClass, CheckResult, LatencyBreach};
use crate::errors::Result;
use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity level of one emitted event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl EventLevel {
    /// Level a finished check is reported at
    pub fn for_result(result: &CheckResult) -> Self {
        if !result.succeeded {
            return match result.class {
                CheckClass::Critical => EventLevel::Critical,
                CheckClass::Advisory => EventLevel::Error,
            };
        }

        match result.latency_breach {
            Some(LatencyBreach::Critical) => EventLevel::Critical,
            Some(LatencyBreach::Warning) => EventLevel::Warning,
            None => EventLevel::Info,
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Info => write!(f, "INFO"),
            EventLevel::Warning => write!(f, "WARNING"),
            EventLevel::Error => write!(f, "ERROR"),
            EventLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Scoped handle to the monitoring event stream
pub struct LogSink {
    file: Option<Mutex<File>>,
}

impl LogSink {
    /// Open the sink, appending to `path` when given
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Mutex::new(file))
            }
            None => None,
        };

        Ok(Self { file })
    }

    /// Emit one timestamped event line
    pub fn log(&self, level: EventLevel, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = format!("[{}] {}: {}", timestamp, level, message);

        println!("{}", line);

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                if let Err(e) = writeln!(file, "{}", line) {
                    error!("Failed to append to monitor log file: {}", e);
                }
            }
        }

        match level {
            EventLevel::Info => info!("{}", message),
            EventLevel::Warning => warn!("{}", message),
            EventLevel::Error | EventLevel::Critical => error!("{}", message),
        }
    }
}
