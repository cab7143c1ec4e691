// =====================================================================================
// SERVICE DEFINITIONS
// =====================================================================================

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ChannelConfig;

pub const MAX_CODE_LENGTH: usize = 8;

fn default_true() -> bool {
    true
}

fn default_retry_timeout() -> u64 {
    10
}

/// Rules a response must satisfy for the service to count as healthy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValidationRules {
    #[serde(default = "default_true")]
    pub status_200: bool,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub max_latency_ms: Option<u64>,
    #[serde(default)]
    pub min_body_bytes: Option<usize>,
    #[serde(default)]
    pub valid_certificate: bool,
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout_seconds: u64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            status_200: true,
            json: false,
            max_latency_ms: None,
            min_body_bytes: None,
            valid_certificate: false,
            retry_timeout_seconds: default_retry_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OwnerDefinition {
    pub name: String,
    pub cell: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceDefinition {
    pub name: String,
    pub url: String,
    /// Operator-chosen short code; generated at load time when absent.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub tests: ValidationRules,
    #[serde(default)]
    pub owners: Vec<OwnerDefinition>,
    #[serde(default)]
    pub alerters: Vec<String>,
}

pub(crate) fn check_http_url(raw: &str) -> Result<(), String> {
    let uri: http::Uri = raw
        .parse()
        .map_err(|e| format!("'{raw}' is not a valid URL ({e})"))?;
    match uri.scheme_str() {
        Some("http") | Some("https") if uri.host().is_some() => Ok(()),
        _ => Err(format!("'{raw}' must be an absolute http(s) URL")),
    }
}

/// Cross-checks service definitions against the configured alerters.
pub fn problems(
    services: &[ServiceDefinition],
    alerters: &HashMap<String, ChannelConfig>,
) -> Vec<String> {
    let mut problems = Vec::new();
    let mut codes = HashSet::new();

    if services.is_empty() {
        problems.push("No services found.".to_string());
    }

    for (index, service) in services.iter().enumerate() {
        let scope = if service.name.trim().is_empty() {
            problems.push(format!("service #{index}: name is empty"));
            format!("service #{index}")
        } else {
            format!("service '{}'", service.name)
        };

        if let Err(reason) = check_http_url(&service.url) {
            problems.push(format!("{scope}: url {reason}"));
        }

        if let Some(code) = &service.code {
            let code = code.to_lowercase();
            if code.is_empty()
                || code.len() > MAX_CODE_LENGTH
                || !code.chars().all(|c| c.is_ascii_alphanumeric())
            {
                problems.push(format!(
                    "{scope}: code '{code}' must be 1-{MAX_CODE_LENGTH} alphanumeric characters"
                ));
            } else if !codes.insert(code.clone()) {
                problems.push(format!("{scope}: code '{code}' is already used"));
            }
        }

        if service.tests.retry_timeout_seconds == 0 {
            problems.push(format!("{scope}: retry_timeout_seconds must be greater than zero"));
        }
        if service.tests.max_latency_ms == Some(0) {
            problems.push(format!("{scope}: max_latency_ms must be greater than zero"));
        }

        for owner in &service.owners {
            if owner.cell.trim().is_empty() {
                problems.push(format!("{scope}: owner '{}' has no cell number", owner.name));
            }
        }

        for alerter in &service.alerters {
            if !alerters.contains_key(alerter) {
                problems.push(format!("{scope}: unknown alerter '{alerter}'"));
            }
        }
    }

    problems
}
