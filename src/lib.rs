//! IVOR Health Monitor Library
//!
//! This library provides components for polling the HTTP health/chat
//! endpoints of the IVOR backend and its sibling frontend, probing the
//! backend OS process, and folding each sweep into an overall status.

pub mod checks;
pub mod config;
pub mod errors;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod resources;
pub mod status;

pub use checks::{CheckClass, CheckResult, ServiceTarget};
pub use config::{Config, ThresholdPolicy};
pub use errors::{CheckFailure, MonitorError, Result};
pub use monitor::Monitor;
pub use probe::{ProbeTransport, ReqwestTransport};
pub use resources::{NullLocator, ProcessLocator, SystemLocator};
pub use status::{CycleSummary, OverallStatus};
