pub mod commands;
pub mod welcome;

pub use commands::{CommandService, USAGE_MESSAGE};
pub use welcome::{welcome_message, welcome_owners};
