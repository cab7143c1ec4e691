// =====================================================================================
// MESSAGING CELL MODELS
// =====================================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

/// Fields relayed by the SMS provider for a reply, as query or form parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

impl InboundSms {
    pub fn new(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            body: Some(body.into()),
        }
    }

    /// Sender and text, both required.
    pub fn parts(&self) -> Result<(&str, &str), MessagingError> {
        let from = self
            .from
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or(MessagingError::MissingField("From"))?;
        let body = self
            .body
            .as_deref()
            .ok_or(MessagingError::MissingField("Body"))?;
        Ok((from, body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    pub fn enables(self) -> bool {
        matches!(self, Command::Start)
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Command::Start => "started",
            Command::Stop => "stopped",
        }
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
        }
    }
}

/// What an inbound message led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Missing fields or unknown sender; nobody was texted.
    Ignored,
    UsageSent,
    ServiceNotFound { code: String },
    Applied {
        code: String,
        command: Command,
        /// Other owners who received a notice.
        notified: usize,
    },
}
