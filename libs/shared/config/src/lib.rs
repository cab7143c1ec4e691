// =====================================================================================
// SHARED CONFIGURATION
// =====================================================================================
//
// Static configuration for the whole process, decoded once at startup from two
// JSON documents:
// - `config.json`   -> `AppConfig` (tick interval, alert channels, messaging)
// - `services.json` -> `Vec<ServiceDefinition>` (what to probe and who owns it)
//
// Decoding is strict (typed structs, tagged channel kinds) and validation
// collects every problem before reporting, so an operator sees all mistakes
// in one run.
// =====================================================================================

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub mod services;

pub use services::{OwnerDefinition, ServiceDefinition, ValidationRules};

pub const MIN_TEST_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_CONNECTIVITY_URL: &str = "https://www.google.com";
pub const DEFAULT_INCIDENT_ENDPOINT: &str =
    "https://events.pagerduty.com/generic/2010-04-15/create_event.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Credentials and endpoint of an SMS provider account (Twilio-compatible).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmsAccount {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_url: String,
}

impl SmsAccount {
    fn validate(&self, scope: &str, problems: &mut Vec<String>) {
        if self.account_sid.trim().is_empty() {
            problems.push(format!("{scope}: account_sid is empty"));
        }
        if self.auth_token.trim().is_empty() {
            problems.push(format!("{scope}: auth_token is empty"));
        }
        if self.from_number.trim().is_empty() {
            problems.push(format!("{scope}: from_number is empty"));
        }
        if let Err(reason) = services::check_http_url(&self.api_url) {
            problems.push(format!("{scope}: api_url {reason}"));
        }
    }
}

/// One configured alert channel instance, tagged by its `type`.
///
/// An unknown `type` fails decoding, which surfaces as a configuration error
/// instead of a crash at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelConfig {
    Pagerduty {
        integration_key: String,
        #[serde(default = "default_incident_endpoint")]
        endpoint: String,
    },
    Sms {
        #[serde(flatten)]
        account: SmsAccount,
        #[serde(default)]
        recipients: HashMap<String, String>,
    },
}

impl ChannelConfig {
    fn validate(&self, name: &str, problems: &mut Vec<String>) {
        let scope = format!("alerter '{name}'");
        match self {
            ChannelConfig::Pagerduty {
                integration_key,
                endpoint,
            } => {
                if integration_key.trim().is_empty() {
                    problems.push(format!("{scope}: integration_key is empty"));
                }
                if let Err(reason) = services::check_http_url(endpoint) {
                    problems.push(format!("{scope}: endpoint {reason}"));
                }
            }
            ChannelConfig::Sms { account, recipients } => {
                account.validate(&scope, problems);
                for (recipient, number) in recipients {
                    if number.trim().is_empty() {
                        problems.push(format!("{scope}: recipient '{recipient}' has no number"));
                    }
                }
            }
        }
    }
}

fn default_incident_endpoint() -> String {
    DEFAULT_INCIDENT_ENDPOINT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MessagingConfig {
    pub twilio: SmsAccount,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
    #[serde(default)]
    pub welcome_owners: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_callback_path() -> String {
    "/sms/reply".to_string()
}

fn default_connectivity_url() -> String {
    DEFAULT_CONNECTIVITY_URL.to_string()
}

fn default_connectivity_budget() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Seconds between two ticks.
    pub test_interval: u64,
    #[serde(default = "default_connectivity_url")]
    pub connectivity_url: String,
    #[serde(default = "default_connectivity_budget")]
    pub connectivity_budget_seconds: u64,
    #[serde(default)]
    pub alerters: HashMap<String, ChannelConfig>,
    pub messaging: MessagingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: AppConfig = read_json(path.as_ref())?;
        let problems = config.problems();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        Ok(config)
    }

    /// Every problem found in this document on its own.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.test_interval < MIN_TEST_INTERVAL_SECONDS {
            problems.push(format!(
                "test_interval too short, must be {MIN_TEST_INTERVAL_SECONDS} second(s) or higher"
            ));
        }
        if self.connectivity_budget_seconds == 0 {
            problems.push("connectivity_budget_seconds must be greater than zero".to_string());
        }
        if let Err(reason) = services::check_http_url(&self.connectivity_url) {
            problems.push(format!("connectivity_url {reason}"));
        }

        let mut names: Vec<&String> = self.alerters.keys().collect();
        names.sort();
        for name in names {
            self.alerters[name].validate(name, &mut problems);
        }

        self.messaging.twilio.validate("messaging.twilio", &mut problems);
        if !self.messaging.callback_path.starts_with('/') {
            problems.push("messaging.callback_path must start with '/'".to_string());
        }
        if self.messaging.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            problems.push(format!(
                "messaging.listen_addr '{}' is not a socket address",
                self.messaging.listen_addr
            ));
        }

        problems
    }
}

/// Both documents, validated against each other.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub app: AppConfig,
    pub services: Vec<ServiceDefinition>,
}

impl LoadedConfig {
    pub fn load(app_path: impl AsRef<Path>, services_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let app: AppConfig = read_json(app_path.as_ref())?;
        let services: Vec<ServiceDefinition> = read_json(services_path.as_ref())?;
        let loaded = Self { app, services };
        loaded.validate()?;
        info!(
            services = loaded.services.len(),
            alerters = loaded.app.alerters.len(),
            "Successfully loaded config"
        );
        Ok(loaded)
    }

    /// Paths come from `WATCHTOWER_CONFIG` / `WATCHTOWER_SERVICES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_path = env::var("WATCHTOWER_CONFIG").unwrap_or_else(|_| {
            warn!("WATCHTOWER_CONFIG not set, using config.json");
            "config.json".to_string()
        });
        let services_path = env::var("WATCHTOWER_SERVICES").unwrap_or_else(|_| {
            warn!("WATCHTOWER_SERVICES not set, using services.json");
            "services.json".to_string()
        });
        Self::load(app_path, services_path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = self.app.problems();
        problems.extend(services::problems(&self.services, &self.app.alerters));
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
