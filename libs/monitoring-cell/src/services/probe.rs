// =====================================================================================
// PROBE PIPELINE
// =====================================================================================
//
// One probe = one GET against the service URL, followed by the configured rules
// in a fixed order: status, JSON, latency, body size. The first failing rule is
// reported. Everything except an invalid certificate is retried within the
// service's retry budget.
//
// =====================================================================================

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::IgnoredAny;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use shared_config::ValidationRules;
use shared_utils::{retry, AttemptError, RetryPolicy};

use crate::error::{MonitoringError, ProbeError};

/// Measurements of a passing probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub status: u16,
    pub latency: Duration,
    pub body_bytes: usize,
}

pub struct ProbePipeline {
    verifying: Client,
    lenient: Client,
    base_policy: RetryPolicy,
}

impl ProbePipeline {
    pub fn new() -> Result<Self, MonitoringError> {
        Ok(Self {
            verifying: Client::builder().build()?,
            lenient: Client::builder().danger_accept_invalid_certs(true).build()?,
            base_policy: RetryPolicy::default(),
        })
    }

    /// Backoff shape for probes. The budget always comes from the service's rules.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.base_policy = policy;
        self
    }

    #[instrument(skip(self, rules))]
    pub async fn run(&self, url: &str, rules: &ValidationRules) -> Result<ProbeReport, ProbeError> {
        let policy = RetryPolicy {
            max_elapsed: Duration::from_secs(rules.retry_timeout_seconds),
            ..self.base_policy.clone()
        };
        let client = if rules.valid_certificate {
            &self.verifying
        } else {
            &self.lenient
        };

        let report = retry("probe", &policy, || probe_once(client, url, rules)).await?;
        debug!(
            status = report.status,
            latency_ms = report.latency.as_millis() as u64,
            body_bytes = report.body_bytes,
            "Probe passed"
        );
        Ok(report)
    }
}

async fn probe_once(
    client: &Client,
    url: &str,
    rules: &ValidationRules,
) -> Result<ProbeReport, AttemptError<ProbeError>> {
    let started = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        if is_certificate_error(&e) {
            AttemptError::Permanent(ProbeError::InvalidCertificate(error_chain(&e)))
        } else {
            warn!(url, error = %e, "Encountered error while retrieving URL");
            AttemptError::Transient(ProbeError::Unreachable(error_chain(&e)))
        }
    })?;

    let status = response.status();
    let status_ok = if rules.status_200 {
        status == StatusCode::OK
    } else {
        status.is_success()
    };
    if !status_ok {
        return Err(AttemptError::Transient(ProbeError::BadStatus {
            status: status.as_u16(),
        }));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| AttemptError::Transient(ProbeError::Unreachable(error_chain(&e))))?;
    let latency = started.elapsed();

    if rules.json {
        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
            warn!(url, error = %e, "Response failed JSON validation");
            return Err(AttemptError::Transient(ProbeError::InvalidJson(e.to_string())));
        }
    }

    if let Some(limit_ms) = rules.max_latency_ms {
        let measured_ms = latency.as_millis() as u64;
        if measured_ms > limit_ms {
            return Err(AttemptError::Transient(ProbeError::LatencyExceeded {
                measured_ms,
                limit_ms,
            }));
        }
    }

    if let Some(minimum) = rules.min_body_bytes {
        if body.len() < minimum {
            return Err(AttemptError::Transient(ProbeError::BodyTooSmall {
                actual: body.len(),
                minimum,
            }));
        }
    }

    Ok(ProbeReport {
        status: status.as_u16(),
        latency,
        body_bytes: body.len(),
    })
}

fn is_certificate_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.to_string().to_lowercase().contains("certificate") {
            return true;
        }
        source = e.source();
    }
    false
}

/// reqwest's top-level message hides the interesting part in its sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}
