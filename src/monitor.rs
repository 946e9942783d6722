//! Cycle scheduler driving the health checks
//!
//! One sweep runs every configured check strictly sequentially and folds
//! the results into a [`CycleSummary`]. A single long-lived SIGINT
//! listener feeds a shutdown flag: an interrupt that arrives while a
//! sweep is in flight is held and observed as soon as the sweep ends, so
//! the sweep always runs to completion and a partial summary is never
//! emitted as if complete.

use crate::checks::{run_endpoint_check, ServiceTarget};
use crate::config::Config;
use crate::errors::{MonitorError, Result};
use crate::probe::ProbeTransport;
use crate::report::{EventLevel, LogSink};
use crate::resources::{run_resource_probe, ProcessLocator};
use crate::status::{CycleSummary, OverallStatus};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Health monitor orchestrating checks, aggregation, and reporting
pub struct Monitor {
    config: Config,
    targets: Vec<ServiceTarget>,
    transport: Arc<dyn ProbeTransport>,
    locator: Box<dyn ProcessLocator>,
    sink: LogSink,
}

impl Monitor {
    /// Create a new monitor with injected transport and process locator
    pub fn new(
        config: Config,
        transport: Arc<dyn ProbeTransport>,
        locator: Box<dyn ProcessLocator>,
    ) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let sink = LogSink::open(config.log_file.as_deref())?;
        let targets = ServiceTarget::defaults(&config);

        Ok(Self {
            config,
            targets,
            transport,
            locator,
            sink,
        })
    }

    /// Run one full sweep over all targets and return its summary.
    ///
    /// Checks run one after another, each blocking on its own network
    /// call up to its timeout; every outcome is logged exactly once.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> CycleSummary {
        let started_at = Utc::now();
        self.sink
            .log(EventLevel::Info, "=== Starting full health check ===");

        let mut results = Vec::new();

        for target in &self.targets {
            for endpoint in &target.endpoints {
                let result = run_endpoint_check(
                    self.transport.as_ref(),
                    target,
                    endpoint,
                    &self.config.thresholds,
                )
                .await;

                self.sink.log(
                    EventLevel::for_result(&result),
                    &format!("{} {}: {}", result.target, result.check, result.detail),
                );
                results.push(result);
            }
        }

        if let Some(pattern) = &self.config.process_pattern {
            let result =
                run_resource_probe(self.locator.as_ref(), pattern, &self.config.thresholds);
            self.sink.log(
                EventLevel::for_result(&result),
                &format!("{} {}: {}", result.target, result.check, result.detail),
            );
            results.push(result);
        }

        let summary = CycleSummary::new(started_at, results);
        self.log_summary(&summary);
        summary
    }

    /// Run sweeps indefinitely until the operator interrupts.
    ///
    /// Installs a single ctrl-c listener up front and delegates to
    /// [`Monitor::run_with_shutdown`].
    pub async fn run(&self) -> Result<OverallStatus> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // One listener for the whole run; a signal delivered mid-sweep
        // stays latched in the channel until the loop looks at it.
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(true);
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Run sweeps indefinitely until the shutdown flag is raised.
    ///
    /// Sleeps the normal interval between sweeps, shortened to the
    /// critical interval while the last sweep was CRITICAL to increase
    /// observation density during incidents. The flag is consulted right
    /// after each sweep and during the sleep, never mid-sweep. Returns
    /// the last overall status once stopped.
    pub async fn run_with_shutdown(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<OverallStatus> {
        info!(
            "Starting continuous monitoring (interval: {}s, critical interval: {}s)",
            self.config.check_interval.as_secs(),
            self.config.critical_interval.as_secs()
        );

        loop {
            let summary = self.run_once().await;

            if *shutdown.borrow_and_update() {
                self.sink
                    .log(EventLevel::Info, "Monitoring stopped by operator");
                return Ok(summary.overall);
            }

            let pause = self.next_interval(summary.overall);
            tokio::select! {
                _ = sleep(pause) => {}
                changed = shutdown.changed() => {
                    changed.map_err(|e| {
                        MonitorError::Other(format!("Shutdown signal listener lost: {}", e))
                    })?;
                    self.sink
                        .log(EventLevel::Info, "Monitoring stopped by operator");
                    return Ok(summary.overall);
                }
            }
        }
    }

    /// Sleep to apply after a sweep with the given status
    fn next_interval(&self, status: OverallStatus) -> Duration {
        match status {
            OverallStatus::Critical => self.config.critical_interval,
            _ => self.config.check_interval,
        }
    }

    fn log_summary(&self, summary: &CycleSummary) {
        match summary.overall {
            OverallStatus::Healthy => {
                self.sink
                    .log(EventLevel::Info, "All systems operational: HEALTHY");
            }
            OverallStatus::Warning => {
                self.sink.log(
                    EventLevel::Warning,
                    &format!(
                        "System has warnings: WARNING (failed: {})",
                        summary.failed_checks().join(", ")
                    ),
                );
            }
            OverallStatus::Critical => {
                self.sink.log(
                    EventLevel::Critical,
                    &format!(
                        "System has critical failures: CRITICAL (failed: {})",
                        summary.failed_checks().join(", ")
                    ),
                );
            }
        }
    }
}
