// =====================================================================================
// INBOUND COMMAND SERVICE
// =====================================================================================

use std::sync::Arc;

use tracing::{info, instrument, warn};

use alerting_cell::TextMessenger;
use monitoring_cell::{MonitoredService, ServiceRegistry};
use shared_models::Owner;
use shared_utils::phone::same_number;

use crate::error::MessagingError;
use crate::models::{Command, CommandOutcome, InboundSms};

pub const USAGE_MESSAGE: &str =
    "Invalid response, usage: <command> <ID>. Valid commands: start, stop";

pub struct CommandService {
    registry: Arc<ServiceRegistry>,
    messenger: Arc<dyn TextMessenger>,
}

impl CommandService {
    pub fn new(registry: Arc<ServiceRegistry>, messenger: Arc<dyn TextMessenger>) -> Self {
        Self {
            registry,
            messenger,
        }
    }

    /// Applies one inbound message. Never fails: problems end up in the
    /// outcome and the log, replies that cannot be delivered are logged.
    #[instrument(skip(self, sms), fields(from = sms.from.as_deref().unwrap_or("")))]
    pub async fn handle(&self, sms: &InboundSms) -> CommandOutcome {
        let (from, body) = match sms.parts() {
            Ok(parts) => parts,
            Err(e) => {
                warn!(error = %e, "Dropping inbound message");
                return CommandOutcome::Ignored;
            }
        };

        let sender = match self.identify(from) {
            Ok(owner) => owner,
            Err(e) => {
                warn!(error = %e, "Dropping inbound message");
                return CommandOutcome::Ignored;
            }
        };

        let tokens: Vec<&str> = body.split_whitespace().collect();
        let command = match tokens.as_slice() {
            [command, _, ..] => command.parse::<Command>().ok(),
            _ => None,
        };
        let Some(command) = command else {
            info!(body, "Unrecognised command, sending usage");
            self.reply(&sender.cell, USAGE_MESSAGE).await;
            return CommandOutcome::UsageSent;
        };

        let code = tokens[1];
        let Some(service) = self.registry.get(code) else {
            self.reply(&sender.cell, &format!("No service found for code {code}"))
                .await;
            return CommandOutcome::ServiceNotFound {
                code: code.to_string(),
            };
        };

        self.apply(&sender, command, &service).await
    }

    fn identify(&self, from: &str) -> Result<Owner, MessagingError> {
        self.registry
            .find_owner(from)
            .ok_or_else(|| MessagingError::UnknownSender(from.to_string()))
    }

    async fn apply(
        &self,
        sender: &Owner,
        command: Command,
        service: &MonitoredService,
    ) -> CommandOutcome {
        let was_enabled = service.set_enabled(command.enables()).await;
        info!(
            service = %service.code,
            command = %command,
            sender = %sender.name,
            was_enabled,
            "Service monitoring updated by owner"
        );

        let verb = command.past_tense();
        self.reply(&sender.cell, &format!("Alerts for {} {verb}.", service.name))
            .await;

        let notice = format!("Alerts for {} {verb} by {}.", service.name, sender.name);
        let mut notified = 0;
        for owner in service
            .owners
            .iter()
            .filter(|o| !same_number(&o.cell, &sender.cell))
        {
            if self.reply(&owner.cell, &notice).await {
                notified += 1;
            }
        }

        CommandOutcome::Applied {
            code: service.code.clone(),
            command,
            notified,
        }
    }

    async fn reply(&self, to: &str, message: &str) -> bool {
        match self.messenger.send_text(to, message).await {
            Ok(()) => true,
            Err(source) => {
                let e = MessagingError::Delivery {
                    to: to.to_string(),
                    source,
                };
                warn!(error = %e, "Reply could not be delivered");
                false
            }
        }
    }
}
