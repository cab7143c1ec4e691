// =====================================================================================
// MESSAGING CELL - INBOUND SMS COMMANDS
// =====================================================================================
//
// Owners control monitoring by replying to alert texts:
// - `start <ID>` / `stop <ID>` enable or disable monitoring of one service
// - the sender gets a confirmation, the service's other owners a notice
// - unknown senders are dropped without a reply
// - an optional welcome text explains the commands at startup
//
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::MessagingError;
pub use models::{Command, CommandOutcome, InboundSms};
pub use services::{welcome_owners, CommandService};

pub use handlers::MessagingHandlers;
pub use router::create_messaging_router;
