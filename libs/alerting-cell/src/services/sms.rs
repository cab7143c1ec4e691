// =====================================================================================
// SMS PROVIDER CLIENT & SMS ALERT CHANNEL
// =====================================================================================

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use shared_config::SmsAccount;
use shared_models::{Alert, AlertSubject, Owner};
use shared_utils::phone::normalize_number;
use shared_utils::{retry, AttemptError, RetryPolicy};

use crate::error::DispatchError;
use crate::models::ChannelKind;
use crate::services::AlertDispatcher;

const PROVIDER: &str = "sms-provider";

/// Anything that can deliver one text message to one phone number.
#[async_trait]
pub trait TextMessenger: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), DispatchError>;
}

/// Twilio-compatible messages API: form-encoded POST with HTTP Basic auth.
pub struct SmsClient {
    client: Client,
    account: SmsAccount,
    retry_policy: RetryPolicy,
}

impl SmsClient {
    pub fn new(account: SmsAccount) -> Self {
        Self {
            client: Client::new(),
            account,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn post_once(&self, to: &str, body: &str) -> Result<(), AttemptError<DispatchError>> {
        let form = [
            ("To", normalize_number(to)),
            ("From", normalize_number(&self.account.from_number)),
            ("Body", body.to_string()),
        ];

        let response = self
            .client
            .post(&self.account.api_url)
            .basic_auth(&self.account.account_sid, Some(&self.account.auth_token))
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(AttemptError::transient)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let resp_body = response.text().await.unwrap_or_default();
        warn!(resp_code = status.as_u16(), recipient = %to, "Received unexpected response code");

        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(AttemptError::Transient(DispatchError::RateLimited {
                provider: PROVIDER,
                status: status.as_u16(),
            }))
        } else if status.is_client_error() {
            Err(AttemptError::Permanent(DispatchError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                body: resp_body,
            }))
        } else {
            Err(AttemptError::Transient(DispatchError::UnexpectedStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body: resp_body,
            }))
        }
    }
}

#[async_trait]
impl TextMessenger for SmsClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), DispatchError> {
        retry("sms-send", &self.retry_policy, || self.post_once(to, body)).await?;
        debug!(recipient = %to, "SMS sent");
        Ok(())
    }
}

/// Alert channel that texts the owners of the affected service plus any
/// recipients configured on the channel itself.
pub struct SmsDispatcher {
    messenger: Arc<dyn TextMessenger>,
    extra_recipients: Vec<Owner>,
}

impl SmsDispatcher {
    pub fn new(messenger: Arc<dyn TextMessenger>, extra_recipients: Vec<Owner>) -> Self {
        Self {
            messenger,
            extra_recipients,
        }
    }

    /// Owners first, then channel recipients, each phone number once.
    pub fn recipients_for(&self, subject: &AlertSubject) -> Vec<Owner> {
        let mut seen = HashSet::new();
        subject
            .owners
            .iter()
            .chain(self.extra_recipients.iter())
            .filter(|owner| seen.insert(normalize_number(&owner.cell)))
            .cloned()
            .collect()
    }

    #[instrument(skip(self, subject, message), fields(service = %subject.code))]
    async fn broadcast(&self, subject: &AlertSubject, message: &str) -> Result<(), DispatchError> {
        let recipients = self.recipients_for(subject);
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients(subject.code.clone()));
        }

        let mut last_error = None;
        for recipient in &recipients {
            if let Err(e) = self.messenger.send_text(&recipient.cell, message).await {
                warn!(
                    recipient_name = %recipient.name,
                    recipient_number = %recipient.cell,
                    error = %e,
                    "Messaging failed to alert recipient"
                );
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => {
                info!(recipients = recipients.len(), "SMS alert delivered");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AlertDispatcher for SmsDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn trigger(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError> {
        self.broadcast(subject, &format!("{} ID: {}", alert.message, subject.code))
            .await
    }

    async fn resolve(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError> {
        self.broadcast(subject, &alert.message).await
    }
}
