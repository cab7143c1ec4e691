// =====================================================================================
// ALERT VALUE OBJECTS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// A person responsible for a service, reachable by SMS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub cell: String,
}

impl Owner {
    pub fn new(name: impl Into<String>, cell: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: cell.into(),
        }
    }
}

/// What an alert is about: enough of a service for a channel to address it
/// without seeing the service's runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSubject {
    pub code: String,
    pub name: String,
    pub url: String,
    pub owners: Vec<Owner>,
}

/// A single notification event. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        let alert = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            message: message.into(),
        };

        warn!(
            alert_id = %alert.id,
            created_at = %alert.created_at,
            "{}", alert.message
        );

        alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_get_distinct_ids() {
        let first = Alert::new("billing: HTTP status was 500");
        let second = Alert::new("billing: HTTP status was 500");

        assert_ne!(first.id, second.id);
        assert_eq!(first.message, second.message);
        assert!(second.created_at >= first.created_at);
    }
}
