// =====================================================================================
// ALERTING CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_config::ChannelConfig;

/// Closed set of supported channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    IncidentApi,
    Sms,
}

impl ChannelKind {
    pub fn of(config: &ChannelConfig) -> Self {
        match config {
            ChannelConfig::Pagerduty { .. } => ChannelKind::IncidentApi,
            ChannelConfig::Sms { .. } => ChannelKind::Sms,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::IncidentApi => "incident_api",
            ChannelKind::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertAction {
    Trigger,
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDetails {
    pub service: String,
    pub url: String,
    pub code: String,
    pub alert_id: String,
    pub created_at: DateTime<Utc>,
}

/// Incident-API event body. `incident_key` is the service short code so the
/// provider coalesces repeated triggers for one ongoing failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentEvent {
    pub service_key: String,
    pub incident_key: String,
    pub event_type: AlertAction,
    pub description: String,
    pub client: String,
    pub details: IncidentDetails,
}

/// Outcome of delivering one alert to every bound channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}
