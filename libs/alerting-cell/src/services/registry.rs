// =====================================================================================
// ALERT CHANNEL REGISTRY
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use shared_config::ChannelConfig;
use shared_models::Owner;

use crate::error::DispatchError;
use crate::models::ChannelKind;
use crate::services::{AlertDispatcher, IncidentApiClient, SmsClient, SmsDispatcher};

/// A named channel instance bound to its dispatcher.
pub struct AlertChannel {
    pub name: String,
    pub dispatcher: Arc<dyn AlertDispatcher>,
}

impl AlertChannel {
    pub fn kind(&self) -> ChannelKind {
        self.dispatcher.kind()
    }
}

impl std::fmt::Debug for AlertChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertChannel")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<AlertChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(alerters: &HashMap<String, ChannelConfig>) -> Self {
        let mut registry = Self::new();
        for (name, config) in alerters {
            registry.register(name, build_dispatcher(config));
            info!(channel = %name, kind = ChannelKind::of(config).as_str(), "Alert channel registered");
        }
        registry
    }

    pub fn register(&mut self, name: &str, dispatcher: Arc<dyn AlertDispatcher>) {
        self.channels.insert(
            name.to_string(),
            Arc::new(AlertChannel {
                name: name.to_string(),
                dispatcher,
            }),
        );
    }

    pub fn get(&self, name: &str) -> Option<Arc<AlertChannel>> {
        self.channels.get(name).cloned()
    }

    /// Looks up every named binding, failing on the first unknown name.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<AlertChannel>>, DispatchError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| DispatchError::UnknownChannel(name.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// One constructor per channel kind.
fn build_dispatcher(config: &ChannelConfig) -> Arc<dyn AlertDispatcher> {
    match config {
        ChannelConfig::Pagerduty {
            integration_key,
            endpoint,
        } => Arc::new(IncidentApiClient::new(integration_key, endpoint)),
        ChannelConfig::Sms { account, recipients } => {
            let mut extra: Vec<Owner> = recipients
                .iter()
                .map(|(name, cell)| Owner::new(name.clone(), cell.clone()))
                .collect();
            extra.sort_by(|a, b| a.name.cmp(&b.name));
            let messenger = Arc::new(SmsClient::new(account.clone()));
            Arc::new(SmsDispatcher::new(messenger, extra))
        }
    }
}
