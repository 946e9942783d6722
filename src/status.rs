//! Cycle summaries and the two-tier status aggregation

use crate::checks::{CheckClass, CheckResult, LatencyBreach};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Overall status of one monitoring cycle.
///
/// Ordered by severity so dominance resolves with `max`: CRITICAL over
/// WARNING over HEALTHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
}

impl OverallStatus {
    /// Process exit code for one-shot runs
    pub fn exit_code(&self) -> i32 {
        match self {
            OverallStatus::Healthy => 0,
            OverallStatus::Warning => 1,
            OverallStatus::Critical => 2,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Healthy => write!(f, "HEALTHY"),
            OverallStatus::Warning => write!(f, "WARNING"),
            OverallStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One complete sweep over all configured targets
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
    pub overall: OverallStatus,
}

impl CycleSummary {
    /// Derive a summary from a finished cycle's results
    pub fn new(started_at: DateTime<Utc>, results: Vec<CheckResult>) -> Self {
        let overall = aggregate(&results);
        Self {
            cycle_id: Uuid::new_v4().to_string(),
            started_at,
            results,
            overall,
        }
    }

    /// Names of the checks that failed this cycle, as `target/check`
    pub fn failed_checks(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| format!("{}/{}", r.target, r.check))
            .collect()
    }
}

/// Fold one cycle's check results into an overall status.
///
/// Pure and deterministic: the same results and thresholds always produce
/// the same status. A critical-class failure, or a critical-level latency
/// breach on a critical-class check, dominates everything; any other
/// failure or latency breach yields WARNING.
pub fn aggregate(results: &[CheckResult]) -> OverallStatus {
    let critical = results.iter().any(|r| {
        r.class == CheckClass::Critical
            && (!r.succeeded || r.latency_breach == Some(LatencyBreach::Critical))
    });

    if critical {
        return OverallStatus::Critical;
    }

    let warning = results
        .iter()
        .any(|r| !r.succeeded || r.latency_breach.is_some());

    if warning {
        OverallStatus::Warning
    } else {
        OverallStatus::Healthy
    }
}
