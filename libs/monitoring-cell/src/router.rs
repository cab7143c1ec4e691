// =====================================================================================
// MONITORING CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::handlers::{get_health_status, get_service, list_services, MonitoringHandlers};
use crate::services::ServiceRegistry;

/// Read-only status routes.
pub fn create_monitoring_router(registry: Arc<ServiceRegistry>) -> Router {
    let handlers = Arc::new(MonitoringHandlers::new(registry));

    Router::new()
        .route("/health", get(get_health_status))
        .route("/services", get(list_services))
        .route("/services/{code}", get(get_service))
        .layer(CorsLayer::permissive())
        .with_state(handlers)
}
