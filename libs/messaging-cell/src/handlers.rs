// =====================================================================================
// MESSAGING CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
};
use tracing::{debug, Instrument};

use crate::models::InboundSms;
use crate::services::CommandService;

pub struct MessagingHandlers {
    commands: Arc<CommandService>,
}

impl MessagingHandlers {
    pub fn new(commands: CommandService) -> Self {
        Self {
            commands: Arc::new(commands),
        }
    }

    fn dispatch(&self, sms: InboundSms) {
        let commands = self.commands.clone();
        tokio::spawn(
            async move {
                let outcome = commands.handle(&sms).await;
                debug!(?outcome, "Inbound SMS handled");
            }
            .in_current_span(),
        );
    }
}

// The provider only needs a 2xx and gives up on slow webhooks. Commands and
// their replies run in the background; replies go out through the SMS API.

pub async fn receive_sms_query(
    State(handlers): State<Arc<MessagingHandlers>>,
    Query(sms): Query<InboundSms>,
) -> StatusCode {
    handlers.dispatch(sms);
    StatusCode::OK
}

pub async fn receive_sms_form(
    State(handlers): State<Arc<MessagingHandlers>>,
    Form(sms): Form<InboundSms>,
) -> StatusCode {
    handlers.dispatch(sms);
    StatusCode::OK
}
