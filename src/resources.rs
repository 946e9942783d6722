//! OS process/resource probe for the monitored backend
//!
//! Process-table scanning is environment-fragile, so it sits behind the
//! [`ProcessLocator`] capability: [`SystemLocator`] uses the OS process
//! table via `sysinfo`, [`NullLocator`] reports the probe as unavailable
//! on platforms without process introspection.

use crate::checks::{CheckClass, CheckResult};
use crate::config::ThresholdPolicy;
use crate::errors::CheckFailure;
use chrono::Utc;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

pub const RESOURCE_CHECK_NAME: &str = "resources";

/// Resource usage of a located process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessUsage {
    pub pid: u32,
    pub memory_mb: f64,
    pub cpu_percent: f64,
}

/// Capability seam over OS process enumeration
pub trait ProcessLocator: Send + Sync {
    /// Find the first process whose command line contains `pattern`.
    /// `Ok(None)` means enumeration worked but no process matched;
    /// `Err` means enumeration itself is unavailable here.
    fn locate(&self, pattern: &str) -> Result<Option<ProcessUsage>, CheckFailure>;
}

/// Process locator backed by the OS process table
pub struct SystemLocator {
    sys: Mutex<System>,
}

impl SystemLocator {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLocator for SystemLocator {
    fn locate(&self, pattern: &str) -> Result<Option<ProcessUsage>, CheckFailure> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CheckFailure::ResourceUnavailable(
                "process enumeration is not supported on this platform".to_string(),
            ));
        }

        let mut sys = self.sys.lock().map_err(|_| {
            CheckFailure::ResourceUnavailable("process table lock poisoned".to_string())
        })?;
        sys.refresh_processes(ProcessesToUpdate::All, true);

        for (pid, process) in sys.processes() {
            let command_line = process
                .cmd()
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");

            if command_line.contains(pattern) {
                debug!("matched process {} for pattern '{}'", pid, pattern);
                return Ok(Some(ProcessUsage {
                    pid: pid.as_u32(),
                    memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
                    cpu_percent: process.cpu_usage() as f64,
                }));
            }
        }

        Ok(None)
    }
}

/// Always-unavailable locator for environments without process introspection
pub struct NullLocator;

impl ProcessLocator for NullLocator {
    fn locate(&self, _pattern: &str) -> Result<Option<ProcessUsage>, CheckFailure> {
        Err(CheckFailure::ResourceUnavailable(
            "process enumeration disabled".to_string(),
        ))
    }
}

/// Fold one process/resource probe into a cycle result.
///
/// A missing process is a critical-class failure (the backend is down);
/// memory/CPU threshold breaches and an unavailable probe are advisory,
/// never critical.
pub fn run_resource_probe(
    locator: &dyn ProcessLocator,
    pattern: &str,
    thresholds: &ThresholdPolicy,
) -> CheckResult {
    let base = |class: CheckClass, succeeded: bool, detail: String| CheckResult {
        target: "ivor-backend".to_string(),
        check: RESOURCE_CHECK_NAME.to_string(),
        class,
        timestamp: Utc::now(),
        succeeded,
        latency: Duration::ZERO,
        latency_breach: None,
        detail,
    };

    let usage = match locator.locate(pattern) {
        Ok(Some(usage)) => usage,
        Ok(None) => {
            return base(
                CheckClass::Critical,
                false,
                format!("backend process not found (pattern '{}')", pattern),
            );
        }
        Err(failure) => {
            return base(CheckClass::Advisory, false, failure.to_string());
        }
    };

    let mut breaches = Vec::new();
    if usage.memory_mb > thresholds.memory_warning_mb {
        breaches.push(format!(
            "memory {:.1}MB exceeds {:.1}MB",
            usage.memory_mb, thresholds.memory_warning_mb
        ));
    }
    if usage.cpu_percent > thresholds.cpu_critical_percent {
        breaches.push(format!(
            "CPU {:.1}% exceeds {:.1}%",
            usage.cpu_percent, thresholds.cpu_critical_percent
        ));
    }

    if breaches.is_empty() {
        base(
            CheckClass::Critical,
            true,
            format!(
                "PID {}: {:.1}MB RAM, {:.1}% CPU",
                usage.pid, usage.memory_mb, usage.cpu_percent
            ),
        )
    } else {
        base(CheckClass::Advisory, false, breaches.join("; "))
    }
}
