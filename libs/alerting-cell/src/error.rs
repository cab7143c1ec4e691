use thiserror::Error;

use shared_utils::RetryError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} rejected the request (HTTP {status}): {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Received HTTP {status} rate limited response from {provider}")]
    RateLimited { provider: &'static str, status: u16 },

    #[error("Received unexpected response from {provider}, code was {status}, body was: '{body}'")]
    UnexpectedStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} timed out after {attempts} attempt(s)")]
    TimedOut { operation: String, attempts: u32 },

    #[error("No recipients for service {0}")]
    NoRecipients(String),

    #[error("Unknown alert channel: {0}")]
    UnknownChannel(String),
}

impl From<RetryError<DispatchError>> for DispatchError {
    fn from(err: RetryError<DispatchError>) -> Self {
        match err {
            RetryError::Permanent { error, .. } | RetryError::Exhausted { error, .. } => error,
            RetryError::TimedOut {
                operation,
                attempts,
                ..
            } => DispatchError::TimedOut {
                operation,
                attempts,
            },
        }
    }
}
