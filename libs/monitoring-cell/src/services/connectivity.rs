use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use shared_config::AppConfig;
use shared_utils::{retry, AttemptError, RetryPolicy};

/// Independent confirmation that this host can reach the internet, so a local
/// outage does not page anyone about every service at once.
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn is_online(&self) -> bool;
}

pub struct HttpConnectivityCheck {
    client: Client,
    url: String,
    policy: RetryPolicy,
}

impl HttpConnectivityCheck {
    pub fn new(url: impl Into<String>, budget: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            policy: RetryPolicy::with_budget(budget),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.connectivity_url.clone(),
            Duration::from_secs(config.connectivity_budget_seconds),
        )
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn get_once(&self) -> Result<(), AttemptError<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AttemptError::Transient(format!(
                "Returned status code {} was not acceptable",
                response.status().as_u16()
            )))
        }
    }
}

#[async_trait]
impl ConnectivityCheck for HttpConnectivityCheck {
    async fn is_online(&self) -> bool {
        match retry("connectivity-check", &self.policy, || self.get_once()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(url = %self.url, error = %e, "No internet connection");
                false
            }
        }
    }
}
