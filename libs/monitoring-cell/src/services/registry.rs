// =====================================================================================
// SERVICE REGISTRY
// =====================================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use alerting_cell::{AlertChannel, ChannelRegistry};
use shared_config::{ServiceDefinition, ValidationRules};
use shared_models::{AlertSubject, Owner};
use shared_utils::phone::{normalize_number, same_number};

use crate::error::MonitoringError;
use crate::models::{ServiceState, ServiceStatus};

pub const CODE_LENGTH: usize = 3;
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// A service being monitored. Identity and rules are fixed at load time;
/// only `state` changes while the process runs.
pub struct MonitoredService {
    pub code: String,
    pub name: String,
    pub url: String,
    pub rules: ValidationRules,
    pub owners: Vec<Owner>,
    pub channels: Vec<Arc<AlertChannel>>,
    state: Mutex<ServiceState>,
    check_lock: Mutex<()>,
}

impl MonitoredService {
    pub fn new(
        code: impl Into<String>,
        definition: &ServiceDefinition,
        channels: Vec<Arc<AlertChannel>>,
    ) -> Self {
        Self {
            code: code.into(),
            name: definition.name.clone(),
            url: definition.url.clone(),
            rules: definition.tests.clone(),
            owners: definition
                .owners
                .iter()
                .map(|o| Owner::new(o.name.clone(), o.cell.clone()))
                .collect(),
            channels,
            state: Mutex::new(ServiceState::new(!definition.disabled)),
            check_lock: Mutex::new(()),
        }
    }

    pub fn subject(&self) -> AlertSubject {
        AlertSubject {
            code: self.code.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            owners: self.owners.clone(),
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.enabled
    }

    /// Returns the previous value.
    pub async fn set_enabled(&self, enabled: bool) -> bool {
        let mut state = self.state.lock().await;
        let previous = state.enabled;
        state.enabled = enabled;
        previous
    }

    pub async fn snapshot(&self) -> ServiceState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> ServiceStatus {
        let state = self.snapshot().await;
        ServiceStatus {
            code: self.code.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            enabled: state.enabled,
            status: state.last_result,
            last_checked: state.last_checked,
            last_error: state.last_error,
        }
    }

    pub fn is_owned_by(&self, number: &str) -> bool {
        self.owners.iter().any(|o| same_number(&o.cell, number))
    }

    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().await
    }

    /// `None` while another check of this service is still running.
    pub(crate) fn try_begin_check(&self) -> Option<MutexGuard<'_, ()>> {
        self.check_lock.try_lock().ok()
    }
}

impl std::fmt::Debug for MonitoredService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredService")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

/// All services of the running process, addressable by short code.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<MonitoredService>>,
    by_code: HashMap<String, usize>,
}

impl ServiceRegistry {
    pub fn from_config(
        definitions: &[ServiceDefinition],
        channels: &ChannelRegistry,
    ) -> Result<Self, MonitoringError> {
        Self::from_config_with_rng(definitions, channels, &mut rand::thread_rng())
    }

    /// Explicit codes are claimed first so a generated code can never steal one.
    pub fn from_config_with_rng<R: Rng>(
        definitions: &[ServiceDefinition],
        channels: &ChannelRegistry,
        rng: &mut R,
    ) -> Result<Self, MonitoringError> {
        let mut taken = HashSet::new();
        for code in definitions.iter().filter_map(|d| d.code.as_deref()) {
            if !taken.insert(code.to_lowercase()) {
                return Err(MonitoringError::DuplicateCode(code.to_string()));
            }
        }

        let mut registry = Self::default();
        for definition in definitions {
            let code = match &definition.code {
                Some(code) => code.to_lowercase(),
                None => {
                    let code = generate_code(rng, &taken)?;
                    taken.insert(code.clone());
                    code
                }
            };

            let bound = channels
                .resolve(&definition.alerters)
                .map_err(|source| MonitoringError::Channel {
                    service: definition.name.clone(),
                    source,
                })?;

            info!(
                service = %code,
                name = %definition.name,
                url = %definition.url,
                channels = bound.len(),
                enabled = !definition.disabled,
                "Service registered"
            );
            registry.insert(Arc::new(MonitoredService::new(code, definition, bound)));
        }

        Ok(registry)
    }

    pub fn insert(&mut self, service: Arc<MonitoredService>) {
        self.by_code
            .insert(service.code.to_lowercase(), self.services.len());
        self.services.push(service);
    }

    pub fn services(&self) -> &[Arc<MonitoredService>] {
        &self.services
    }

    /// Codes are matched case-insensitively.
    pub fn get(&self, code: &str) -> Option<Arc<MonitoredService>> {
        self.by_code
            .get(&code.trim().to_lowercase())
            .map(|&i| self.services[i].clone())
    }

    pub fn find_owner(&self, number: &str) -> Option<Owner> {
        self.services
            .iter()
            .flat_map(|s| s.owners.iter())
            .find(|o| same_number(&o.cell, number))
            .cloned()
    }

    pub fn services_owned_by(&self, number: &str) -> Vec<Arc<MonitoredService>> {
        self.services
            .iter()
            .filter(|s| s.is_owned_by(number))
            .cloned()
            .collect()
    }

    /// Every owner once, in order of first appearance.
    pub fn owners(&self) -> Vec<Owner> {
        let mut seen = HashSet::new();
        self.services
            .iter()
            .flat_map(|s| s.owners.iter())
            .filter(|o| seen.insert(normalize_number(&o.cell)))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Random lowercase code of `CODE_LENGTH` letters that is not in `taken`.
pub fn generate_code<R: Rng>(rng: &mut R, taken: &HashSet<String>) -> Result<String, MonitoringError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code: String = (0..CODE_LENGTH)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        if !taken.contains(&code) {
            return Ok(code);
        }
        debug!(code = %code, attempt, "Generated service code already in use");
    }
    Err(MonitoringError::CodesExhausted(MAX_CODE_ATTEMPTS))
}
