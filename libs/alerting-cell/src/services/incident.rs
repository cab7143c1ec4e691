// =====================================================================================
// INCIDENT API CLIENT (PagerDuty generic events v1)
// =====================================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, instrument};

use shared_models::{Alert, AlertSubject};
use shared_utils::{retry, AttemptError, RetryPolicy};

use crate::error::DispatchError;
use crate::models::{AlertAction, ChannelKind, IncidentDetails, IncidentEvent};
use crate::services::AlertDispatcher;

pub const CLIENT_NAME: &str = "watchtower";
const PROVIDER: &str = "incident-api";

pub struct IncidentApiClient {
    client: Client,
    integration_key: String,
    endpoint: String,
    retry_policy: RetryPolicy,
}

impl IncidentApiClient {
    pub fn new(integration_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            integration_key: integration_key.into(),
            endpoint: endpoint.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn build_event(&self, subject: &AlertSubject, alert: &Alert, event_type: AlertAction) -> IncidentEvent {
        IncidentEvent {
            service_key: self.integration_key.clone(),
            incident_key: subject.code.clone(),
            event_type,
            description: alert.message.clone(),
            client: CLIENT_NAME.to_string(),
            details: IncidentDetails {
                service: subject.name.clone(),
                url: subject.url.clone(),
                code: subject.code.clone(),
                alert_id: alert.id.to_string(),
                created_at: alert.created_at,
            },
        }
    }

    #[instrument(skip(self, event), fields(incident_key = %event.incident_key, event_type = ?event.event_type))]
    pub async fn send_event(&self, event: &IncidentEvent) -> Result<(), DispatchError> {
        retry("incident-api", &self.retry_policy, || self.post_once(event)).await?;
        info!("Incident event accepted");
        Ok(())
    }

    async fn post_once(&self, event: &IncidentEvent) -> Result<(), AttemptError<DispatchError>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(event)
            .send()
            .await
            .map_err(AttemptError::transient)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("Incident API response: {} - {}", status, body);

        match status {
            StatusCode::OK => Ok(()),
            StatusCode::BAD_REQUEST => {
                error!(resp_body = %body, "Received 400 Invalid Event response");
                Err(AttemptError::Permanent(DispatchError::Rejected {
                    provider: PROVIDER,
                    status: status.as_u16(),
                    body,
                }))
            }
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(AttemptError::Transient(DispatchError::RateLimited {
                    provider: PROVIDER,
                    status: status.as_u16(),
                }))
            }
            _ => Err(AttemptError::Transient(DispatchError::UnexpectedStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            })),
        }
    }
}

#[async_trait]
impl AlertDispatcher for IncidentApiClient {
    fn kind(&self) -> ChannelKind {
        ChannelKind::IncidentApi
    }

    async fn trigger(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError> {
        let event = self.build_event(subject, alert, AlertAction::Trigger);
        self.send_event(&event).await
    }

    async fn resolve(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError> {
        let event = self.build_event(subject, alert, AlertAction::Resolve);
        self.send_event(&event).await
    }
}
