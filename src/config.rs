//! Configuration management for the health monitor

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Static alert thresholds, loaded once at process start and never mutated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Latency above this is a warning-level breach (seconds)
    pub response_time_warning: f64,

    /// Latency above this is a critical-level breach (seconds)
    pub response_time_critical: f64,

    /// Backend resident memory above this is an advisory breach (MB)
    pub memory_warning_mb: f64,

    /// Backend CPU utilization above this is an advisory breach (percent)
    pub cpu_critical_percent: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            response_time_warning: 1.0,
            response_time_critical: 3.0,
            memory_warning_mb: 200.0,
            cpu_critical_percent: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the IVOR backend
    pub backend_url: String,

    /// Base URL of the website frontend
    pub frontend_url: String,

    /// Alert thresholds applied to every cycle
    pub thresholds: ThresholdPolicy,

    /// Sleep between sweeps while the last cycle was HEALTHY or WARNING
    pub check_interval: Duration,

    /// Shortened sleep between sweeps while the last cycle was CRITICAL
    pub critical_interval: Duration,

    /// Log file the line-oriented event stream is appended to
    pub log_file: Option<PathBuf>,

    /// Command-line fragment identifying the backend process.
    /// `None` disables the process/resource probe entirely.
    pub process_pattern: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            frontend_url: "http://localhost:4173".to_string(),
            thresholds: ThresholdPolicy::default(),
            check_interval: Duration::from_secs(30),
            critical_interval: Duration::from_secs(10),
            log_file: Some(PathBuf::from("monitoring.log")),
            process_pattern: Some("main_working.py".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(backend_url) = env::var("IVOR_URL") {
            config.backend_url = backend_url;
        }

        if let Ok(frontend_url) = env::var("WEBSITE_URL") {
            config.frontend_url = frontend_url;
        }

        if let Ok(interval) = env::var("CHECK_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.check_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(interval) = env::var("CRITICAL_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.critical_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(warning) = env::var("RESPONSE_TIME_WARNING_SECONDS") {
            if let Ok(seconds) = warning.parse() {
                config.thresholds.response_time_warning = seconds;
            }
        }

        if let Ok(critical) = env::var("RESPONSE_TIME_CRITICAL_SECONDS") {
            if let Ok(seconds) = critical.parse() {
                config.thresholds.response_time_critical = seconds;
            }
        }

        if let Ok(memory) = env::var("MEMORY_WARNING_MB") {
            if let Ok(mb) = memory.parse() {
                config.thresholds.memory_warning_mb = mb;
            }
        }

        if let Ok(cpu) = env::var("CPU_CRITICAL_PERCENT") {
            if let Ok(percent) = cpu.parse() {
                config.thresholds.cpu_critical_percent = percent;
            }
        }

        if let Ok(log_file) = env::var("MONITOR_LOG_FILE") {
            if log_file.is_empty() {
                config.log_file = None;
            } else {
                config.log_file = Some(PathBuf::from(log_file));
            }
        }

        if let Ok(pattern) = env::var("BACKEND_PROCESS_PATTERN") {
            if pattern.is_empty() {
                config.process_pattern = None;
            } else {
                config.process_pattern = Some(pattern);
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend_url.is_empty() {
            return Err("backend_url cannot be empty".to_string());
        }

        if self.frontend_url.is_empty() {
            return Err("frontend_url cannot be empty".to_string());
        }

        if self.check_interval.is_zero() {
            return Err("check_interval must be greater than 0".to_string());
        }

        if self.critical_interval.is_zero() {
            return Err("critical_interval must be greater than 0".to_string());
        }

        if self.thresholds.response_time_warning <= 0.0 {
            return Err("response_time_warning must be greater than 0".to_string());
        }

        if self.thresholds.response_time_critical <= self.thresholds.response_time_warning {
            return Err(
                "response_time_critical must be greater than response_time_warning".to_string(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.critical_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds = ThresholdPolicy::default();
        assert_eq!(thresholds.response_time_warning, 1.0);
        assert_eq!(thresholds.response_time_critical, 3.0);
        assert_eq!(thresholds.memory_warning_mb, 200.0);
        assert_eq!(thresholds.cpu_critical_percent, 80.0);
    }

    #[test]
    fn test_inverted_latency_thresholds_rejected() {
        let mut config = Config::default();
        config.thresholds.response_time_warning = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.check_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
