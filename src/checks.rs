//! Service targets, content assertions, and the per-endpoint checker

use crate::config::{Config, ThresholdPolicy};
use crate::errors::CheckFailure;
use crate::probe::ProbeTransport;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Severity class a check contributes to during aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckClass {
    /// Liveness probe; failure means the monitored service is down
    Critical,

    /// Secondary functional probe; failure degrades confidence only
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Latency threshold breach recorded alongside an otherwise successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LatencyBreach {
    Warning,
    Critical,
}

/// Assertion applied to a 2xx response body
#[derive(Debug, Clone)]
pub enum ContentAssertion {
    /// JSON body must carry the named field
    JsonFieldPresent(String),

    /// JSON body must carry the named field with exactly this string value
    JsonFieldEquals(String, String),

    /// JSON body must carry the named field with a non-empty string value
    JsonFieldNonEmpty(String),

    /// Every boolean in the named JSON object must be true. An absent
    /// field passes; the point is flagging explicitly disabled flags.
    JsonFlagsAllTrue(String),

    /// Raw body must contain the substring
    BodyContains(String),
}

impl ContentAssertion {
    /// Apply the assertion to a response body, naming the missing
    /// field/substring on failure
    pub fn apply(&self, body: &str) -> Result<(), CheckFailure> {
        match self {
            ContentAssertion::JsonFieldPresent(field) => {
                let value = parse_json(body)?;
                if value.get(field).is_none() {
                    return Err(CheckFailure::ContentAssertion(format!(
                        "missing JSON field '{}'",
                        field
                    )));
                }
                Ok(())
            }
            ContentAssertion::JsonFieldEquals(field, expected) => {
                let value = parse_json(body)?;
                match value.get(field).and_then(Value::as_str) {
                    Some(actual) if actual == expected => Ok(()),
                    Some(actual) => Err(CheckFailure::ContentAssertion(format!(
                        "JSON field '{}' is '{}', expected '{}'",
                        field, actual, expected
                    ))),
                    None => Err(CheckFailure::ContentAssertion(format!(
                        "missing JSON field '{}'",
                        field
                    ))),
                }
            }
            ContentAssertion::JsonFieldNonEmpty(field) => {
                let value = parse_json(body)?;
                match value.get(field).and_then(Value::as_str) {
                    Some(actual) if !actual.is_empty() => Ok(()),
                    Some(_) => Err(CheckFailure::ContentAssertion(format!(
                        "JSON field '{}' is empty",
                        field
                    ))),
                    None => Err(CheckFailure::ContentAssertion(format!(
                        "missing JSON field '{}'",
                        field
                    ))),
                }
            }
            ContentAssertion::JsonFlagsAllTrue(field) => {
                let value = parse_json(body)?;
                let flags = match value.get(field).and_then(Value::as_object) {
                    Some(flags) => flags,
                    None => return Ok(()),
                };

                let disabled: Vec<&str> = flags
                    .iter()
                    .filter(|(_, enabled)| matches!(enabled, Value::Bool(false)))
                    .map(|(name, _)| name.as_str())
                    .collect();

                if disabled.is_empty() {
                    Ok(())
                } else {
                    Err(CheckFailure::ContentAssertion(format!(
                        "JSON field '{}' has disabled flags: {}",
                        field,
                        disabled.join(", ")
                    )))
                }
            }
            ContentAssertion::BodyContains(substring) => {
                if body.contains(substring) {
                    Ok(())
                } else {
                    Err(CheckFailure::ContentAssertion(format!(
                        "body does not contain '{}'",
                        substring
                    )))
                }
            }
        }
    }
}

fn parse_json(body: &str) -> Result<Value, CheckFailure> {
    serde_json::from_str(body)
        .map_err(|_| CheckFailure::ContentAssertion("response body is not valid JSON".to_string()))
}

/// One HTTP check declared on a target
#[derive(Debug, Clone)]
pub struct EndpointCheck {
    pub name: String,
    pub path: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub class: CheckClass,
    pub assertions: Vec<ContentAssertion>,
}

/// A monitored service and its declared checks. Immutable after
/// configuration load.
#[derive(Debug, Clone)]
pub struct ServiceTarget {
    pub name: String,
    pub base_url: String,
    pub endpoints: Vec<EndpointCheck>,
}

impl ServiceTarget {
    /// Build the default target set for the configured backend and frontend
    pub fn defaults(config: &Config) -> Vec<ServiceTarget> {
        vec![
            ServiceTarget {
                name: "ivor-backend".to_string(),
                base_url: config.backend_url.clone(),
                endpoints: vec![
                    EndpointCheck {
                        name: "health".to_string(),
                        path: "/health/".to_string(),
                        method: HttpMethod::Get,
                        body: None,
                        timeout: Duration::from_secs(5),
                        class: CheckClass::Critical,
                        assertions: vec![ContentAssertion::JsonFieldPresent(
                            "status".to_string(),
                        )],
                    },
                    // Re-reads the health body for the feature flag map;
                    // a disabled feature degrades confidence only
                    EndpointCheck {
                        name: "features".to_string(),
                        path: "/health/".to_string(),
                        method: HttpMethod::Get,
                        body: None,
                        timeout: Duration::from_secs(5),
                        class: CheckClass::Advisory,
                        assertions: vec![ContentAssertion::JsonFlagsAllTrue(
                            "features".to_string(),
                        )],
                    },
                    EndpointCheck {
                        name: "chat".to_string(),
                        path: "/chat/message".to_string(),
                        method: HttpMethod::Post,
                        body: Some(serde_json::json!({
                            "message": "Monitoring test - please respond briefly",
                            "context": "monitoring",
                        })),
                        timeout: Duration::from_secs(10),
                        class: CheckClass::Advisory,
                        assertions: vec![
                            ContentAssertion::JsonFieldEquals(
                                "status".to_string(),
                                "success".to_string(),
                            ),
                            ContentAssertion::JsonFieldNonEmpty("response".to_string()),
                        ],
                    },
                ],
            },
            ServiceTarget {
                name: "website-frontend".to_string(),
                base_url: config.frontend_url.clone(),
                endpoints: vec![EndpointCheck {
                    name: "frontend".to_string(),
                    path: "/".to_string(),
                    method: HttpMethod::Get,
                    body: None,
                    timeout: Duration::from_secs(5),
                    class: CheckClass::Advisory,
                    assertions: vec![
                        ContentAssertion::BodyContains("<!DOCTYPE html>".to_string()),
                        ContentAssertion::BodyContains("BLKOUTUK".to_string()),
                    ],
                }],
            },
        ]
    }
}

/// Outcome of one check in one cycle. Created fresh on every poll and
/// never mutated; retained only for the current cycle's summary.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub target: String,
    pub check: String,
    pub class: CheckClass,
    pub timestamp: DateTime<Utc>,
    pub succeeded: bool,
    pub latency: Duration,
    pub latency_breach: Option<LatencyBreach>,
    pub detail: String,
}

impl CheckResult {
    pub fn success(
        target: &str,
        check: &str,
        class: CheckClass,
        latency: Duration,
        latency_breach: Option<LatencyBreach>,
        detail: String,
    ) -> Self {
        Self {
            target: target.to_string(),
            check: check.to_string(),
            class,
            timestamp: Utc::now(),
            succeeded: true,
            latency,
            latency_breach,
            detail,
        }
    }

    pub fn failure(
        target: &str,
        check: &str,
        class: CheckClass,
        latency: Duration,
        failure: &CheckFailure,
    ) -> Self {
        Self {
            target: target.to_string(),
            check: check.to_string(),
            class,
            timestamp: Utc::now(),
            succeeded: false,
            latency,
            latency_breach: None,
            detail: failure.to_string(),
        }
    }
}

/// Compare a measured latency against the static thresholds
pub fn classify_latency(
    thresholds: &ThresholdPolicy,
    latency: Duration,
) -> Option<LatencyBreach> {
    let seconds = latency.as_secs_f64();

    if seconds > thresholds.response_time_critical {
        Some(LatencyBreach::Critical)
    } else if seconds > thresholds.response_time_warning {
        Some(LatencyBreach::Warning)
    } else {
        None
    }
}

/// Run a single endpoint check against a target.
///
/// One request, bounded timeout, no retries; a failed check is recorded
/// and re-attempted only on the next cycle. A 2xx response that passes
/// its assertions but exceeds a latency threshold still counts as
/// succeeded, with the breach flagged separately for aggregation.
pub async fn run_endpoint_check(
    transport: &dyn ProbeTransport,
    target: &ServiceTarget,
    endpoint: &EndpointCheck,
    thresholds: &ThresholdPolicy,
) -> CheckResult {
    let url = format!(
        "{}{}",
        target.base_url.trim_end_matches('/'),
        endpoint.path
    );

    let start = Instant::now();
    let outcome = match endpoint.method {
        HttpMethod::Get => transport.get(&url, endpoint.timeout).await,
        HttpMethod::Post => {
            let body = endpoint.body.clone().unwrap_or(Value::Null);
            transport.post_json(&url, &body, endpoint.timeout).await
        }
    };
    let latency = start.elapsed();

    let response = match outcome {
        Ok(response) => response,
        Err(failure) => {
            debug!("{}/{} failed: {}", target.name, endpoint.name, failure);
            return CheckResult::failure(&target.name, &endpoint.name, endpoint.class, latency, &failure);
        }
    };

    if !response.is_success() {
        let failure = CheckFailure::Protocol(response.status);
        return CheckResult::failure(&target.name, &endpoint.name, endpoint.class, latency, &failure);
    }

    for assertion in &endpoint.assertions {
        if let Err(failure) = assertion.apply(&response.body) {
            return CheckResult::failure(
                &target.name,
                &endpoint.name,
                endpoint.class,
                latency,
                &failure,
            );
        }
    }

    let breach = classify_latency(thresholds, latency);
    let detail = match breach {
        Some(LatencyBreach::Critical) => format!(
            "OK but response time {:.3}s exceeds critical threshold {:.1}s",
            latency.as_secs_f64(),
            thresholds.response_time_critical
        ),
        Some(LatencyBreach::Warning) => format!(
            "OK but response time {:.3}s exceeds warning threshold {:.1}s",
            latency.as_secs_f64(),
            thresholds.response_time_warning
        ),
        None => format!("OK ({:.3}s)", latency.as_secs_f64()),
    };

    CheckResult::success(&target.name, &endpoint.name, endpoint.class, latency, breach, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::probe::ProbeResponse;

    /// Canned-response transport for exercising the checker without a server
    struct StubTransport {
        response: std::result::Result<ProbeResponse, CheckFailure>,
    }

    #[async_trait]
    impl ProbeTransport for StubTransport {
        async fn get(
            &self,
            _url: &str,
            _timeout: Duration,
        ) -> std::result::Result<ProbeResponse, CheckFailure> {
            self.response.clone()
        }

        async fn post_json(
            &self,
            _url: &str,
            _body: &Value,
            _timeout: Duration,
        ) -> std::result::Result<ProbeResponse, CheckFailure> {
            self.response.clone()
        }
    }

    fn health_endpoint() -> EndpointCheck {
        EndpointCheck {
            name: "health".to_string(),
            path: "/health/".to_string(),
            method: HttpMethod::Get,
            body: None,
            timeout: Duration::from_secs(5),
            class: CheckClass::Critical,
            assertions: vec![ContentAssertion::JsonFieldPresent("status".to_string())],
        }
    }

    fn backend_target() -> ServiceTarget {
        ServiceTarget {
            name: "ivor-backend".to_string(),
            base_url: "http://localhost:8000".to_string(),
            endpoints: vec![health_endpoint()],
        }
    }

    #[tokio::test]
    async fn test_healthy_response_succeeds() {
        let transport = StubTransport {
            response: Ok(ProbeResponse {
                status: 200,
                body: r#"{"status":"healthy"}"#.to_string(),
            }),
        };

        let target = backend_target();
        let result = run_endpoint_check(
            &transport,
            &target,
            &health_endpoint(),
            &ThresholdPolicy::default(),
        )
        .await;

        assert!(result.succeeded);
        assert_eq!(result.latency_breach, None);
        assert_eq!(result.class, CheckClass::Critical);
    }

    #[tokio::test]
    async fn test_non_2xx_recorded_as_protocol_failure() {
        let transport = StubTransport {
            response: Ok(ProbeResponse {
                status: 503,
                body: String::new(),
            }),
        };

        let target = backend_target();
        let result = run_endpoint_check(
            &transport,
            &target,
            &health_endpoint(),
            &ThresholdPolicy::default(),
        )
        .await;

        assert!(!result.succeeded);
        assert!(result.detail.contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_unreachable_target_detail_names_unreachable() {
        let transport = StubTransport {
            response: Err(CheckFailure::Connection("connection refused".to_string())),
        };

        let target = backend_target();
        let result = run_endpoint_check(
            &transport,
            &target,
            &health_endpoint(),
            &ThresholdPolicy::default(),
        )
        .await;

        assert!(!result.succeeded);
        assert!(result.detail.contains("unreachable"));
    }

    #[tokio::test]
    async fn test_missing_json_field_fails_assertion() {
        let transport = StubTransport {
            response: Ok(ProbeResponse {
                status: 200,
                body: r#"{"version":"1.0"}"#.to_string(),
            }),
        };

        let target = backend_target();
        let result = run_endpoint_check(
            &transport,
            &target,
            &health_endpoint(),
            &ThresholdPolicy::default(),
        )
        .await;

        assert!(!result.succeeded);
        assert!(result.detail.contains("'status'"));
    }

    #[test]
    fn test_chat_assertions() {
        let equals = ContentAssertion::JsonFieldEquals("status".to_string(), "success".to_string());
        let non_empty = ContentAssertion::JsonFieldNonEmpty("response".to_string());

        let good = r#"{"status":"success","response":"hi"}"#;
        assert!(equals.apply(good).is_ok());
        assert!(non_empty.apply(good).is_ok());

        let wrong_status = r#"{"status":"error","response":"hi"}"#;
        assert!(equals.apply(wrong_status).is_err());

        let empty_response = r#"{"status":"success","response":""}"#;
        assert!(non_empty.apply(empty_response).is_err());
    }

    #[test]
    fn test_body_contains_assertion() {
        let assertion = ContentAssertion::BodyContains("<!DOCTYPE html>".to_string());
        assert!(assertion.apply("<!DOCTYPE html><html></html>").is_ok());

        let err = assertion.apply("not found page").unwrap_err();
        assert!(err.to_string().contains("<!DOCTYPE html>"));
    }

    #[test]
    fn test_latency_classification() {
        let thresholds = ThresholdPolicy::default();

        assert_eq!(
            classify_latency(&thresholds, Duration::from_millis(50)),
            None
        );
        assert_eq!(
            classify_latency(&thresholds, Duration::from_millis(1500)),
            Some(LatencyBreach::Warning)
        );
        assert_eq!(
            classify_latency(&thresholds, Duration::from_millis(3500)),
            Some(LatencyBreach::Critical)
        );
    }

    #[test]
    fn test_feature_flags_assertion() {
        let assertion = ContentAssertion::JsonFlagsAllTrue("features".to_string());

        let all_enabled = r#"{"status":"healthy","features":{"chat":true,"events":true}}"#;
        assert!(assertion.apply(all_enabled).is_ok());

        // Absent map passes; only explicitly disabled flags are flagged
        let no_features = r#"{"status":"healthy"}"#;
        assert!(assertion.apply(no_features).is_ok());

        let disabled = r#"{"status":"healthy","features":{"chat":true,"events":false}}"#;
        let err = assertion.apply(disabled).unwrap_err();
        assert!(err.to_string().contains("events"));
        assert!(!err.to_string().contains("chat"));
    }

    #[test]
    fn test_default_targets_cover_backend_and_frontend() {
        let config = Config::default();
        let targets = ServiceTarget::defaults(&config);

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "ivor-backend");
        assert_eq!(targets[0].endpoints.len(), 3);
        assert_eq!(targets[0].endpoints[0].class, CheckClass::Critical);
        assert_eq!(targets[0].endpoints[1].class, CheckClass::Advisory);
        assert_eq!(targets[0].endpoints[2].class, CheckClass::Advisory);
        assert_eq!(targets[1].name, "website-frontend");
        // Frontend must look like the real site, not just any HTML page
        assert_eq!(targets[1].endpoints[0].assertions.len(), 2);
    }
}
