use async_trait::async_trait;

use shared_models::{Alert, AlertSubject};

use crate::error::DispatchError;
use crate::models::ChannelKind;

pub mod fanout;
pub mod incident;
pub mod registry;
pub mod sms;

pub use fanout::fan_out;
pub use incident::IncidentApiClient;
pub use registry::{AlertChannel, ChannelRegistry};
pub use sms::{SmsClient, SmsDispatcher, TextMessenger};

/// Trigger/Resolve capability implemented once per channel kind.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Tell the channel that `subject` started failing.
    async fn trigger(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError>;

    /// Tell the channel that `subject` recovered.
    async fn resolve(&self, subject: &AlertSubject, alert: &Alert) -> Result<(), DispatchError>;
}
