use std::sync::Arc;

use axum::{routing::get, Router};

use messaging_cell::{create_messaging_router, CommandService};
use monitoring_cell::{create_monitoring_router, ServiceRegistry};

pub fn create_router(
    registry: Arc<ServiceRegistry>,
    commands: CommandService,
    callback_path: &str,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Watchtower is running!" }))
        .merge(create_monitoring_router(registry))
        .merge(create_messaging_router(commands, callback_path))
}
