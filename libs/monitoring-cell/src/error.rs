use axum::response::{IntoResponse, Response};
use thiserror::Error;

use alerting_cell::DispatchError;
use shared_models::AppError;
use shared_utils::RetryError;

/// Why a single probe of a service failed. Only the first failing rule is reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("{0}")]
    Unreachable(String),

    #[error("HTTP status was {status}")]
    BadStatus { status: u16 },

    #[error("Response was not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response took {measured_ms}ms, expected at most {limit_ms}ms")]
    LatencyExceeded { measured_ms: u64, limit_ms: u64 },

    #[error("Response body was {actual} bytes, expected at least {minimum}")]
    BodyTooSmall { actual: usize, minimum: usize },

    #[error("Invalid TLS certificate: {0}")]
    InvalidCertificate(String),

    #[error("No response within {elapsed_ms}ms ({attempts} attempt(s))")]
    TimedOut { attempts: u32, elapsed_ms: u64 },
}

impl From<RetryError<ProbeError>> for ProbeError {
    fn from(err: RetryError<ProbeError>) -> Self {
        match err {
            RetryError::Permanent { error, .. } | RetryError::Exhausted { error, .. } => error,
            RetryError::TimedOut {
                attempts,
                elapsed_ms,
                ..
            } => ProbeError::TimedOut {
                attempts,
                elapsed_ms,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("No service found for code {0}")]
    ServiceNotFound(String),

    #[error("Service '{service}': {source}")]
    Channel {
        service: String,
        #[source]
        source: DispatchError,
    },

    #[error("Service code '{0}' is used more than once")]
    DuplicateCode(String),

    #[error("Could not find a free service code after {0} attempts")]
    CodesExhausted(usize),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl From<MonitoringError> for AppError {
    fn from(err: MonitoringError) -> Self {
        match &err {
            MonitoringError::ServiceNotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
