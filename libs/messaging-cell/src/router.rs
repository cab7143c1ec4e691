// =====================================================================================
// MESSAGING CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{receive_sms_form, receive_sms_query, MessagingHandlers};
use crate::services::CommandService;

/// Provider webhook for SMS replies, mounted at the configured callback path.
pub fn create_messaging_router(commands: CommandService, callback_path: &str) -> Router {
    let handlers = Arc::new(MessagingHandlers::new(commands));

    Router::new()
        .route(callback_path, get(receive_sms_query).post(receive_sms_form))
        .with_state(handlers)
}
