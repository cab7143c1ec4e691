// =====================================================================================
// MONITORING CELL HANDLERS
// =====================================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};
use futures::future::join_all;
use tracing::instrument;

use crate::error::MonitoringError;
use crate::models::{HealthResponse, HealthStatus, ServiceStatus};
use crate::services::ServiceRegistry;

pub struct MonitoringHandlers {
    registry: Arc<ServiceRegistry>,
    started: Instant,
}

impl MonitoringHandlers {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            started: Instant::now(),
        }
    }

    async fn statuses(&self) -> Vec<ServiceStatus> {
        join_all(self.registry.services().iter().map(|s| s.status())).await
    }
}

// =====================================================================================
// PROCESS HEALTH
// =====================================================================================

#[instrument(skip(handlers))]
pub async fn get_health_status(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<HealthResponse> {
    let statuses = handlers.statuses().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: handlers.started.elapsed().as_secs(),
        services: statuses.len(),
        enabled_services: statuses.iter().filter(|s| s.enabled).count(),
        failing_services: statuses
            .iter()
            .filter(|s| s.status == HealthStatus::Failing)
            .count(),
    })
}

// =====================================================================================
// SERVICE STATUS
// =====================================================================================

#[instrument(skip(handlers))]
pub async fn list_services(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<Vec<ServiceStatus>> {
    Json(handlers.statuses().await)
}

#[instrument(skip(handlers))]
pub async fn get_service(
    State(handlers): State<Arc<MonitoringHandlers>>,
    Path(code): Path<String>,
) -> Result<Json<ServiceStatus>, MonitoringError> {
    let service = handlers
        .registry
        .get(&code)
        .ok_or(MonitoringError::ServiceNotFound(code))?;

    Ok(Json(service.status().await))
}
