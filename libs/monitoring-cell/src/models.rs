// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use alerting_cell::AlertAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Not checked yet since the process started.
    Unknown,
    Healthy,
    Failing,
}

impl HealthStatus {
    /// Applies one probe result and returns the new status together with the
    /// alert to send, if the result crossed an edge.
    ///
    /// The first success after startup is a baseline, not a recovery.
    pub fn next(self, passed: bool) -> (HealthStatus, Option<AlertAction>) {
        match (self, passed) {
            (HealthStatus::Failing, true) => (HealthStatus::Healthy, Some(AlertAction::Resolve)),
            (_, true) => (HealthStatus::Healthy, None),
            (HealthStatus::Failing, false) => (HealthStatus::Failing, None),
            (_, false) => (HealthStatus::Failing, Some(AlertAction::Trigger)),
        }
    }
}

/// Mutable runtime state of one monitored service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState {
    pub enabled: bool,
    pub last_result: HealthStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ServiceState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_result: HealthStatus::Unknown,
            last_checked: None,
            last_error: None,
        }
    }
}

/// What happened to one service during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// A previous check of the same service is still running.
    InFlight,
    Disabled,
    /// The probe failed while the internet was unreachable; nothing changed.
    Suppressed,
    /// The service was disabled while its probe ran; the result was dropped.
    Discarded,
    Checked {
        status: HealthStatus,
        action: Option<AlertAction>,
    },
}

/// Counts of one tick's outcomes, logged once per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub checked: usize,
    pub failing: usize,
    pub triggered: usize,
    pub resolved: usize,
    pub suppressed: usize,
    pub skipped: usize,
}

impl TickSummary {
    pub fn record(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Checked { status, action } => {
                self.checked += 1;
                if status == HealthStatus::Failing {
                    self.failing += 1;
                }
                match action {
                    Some(AlertAction::Trigger) => self.triggered += 1,
                    Some(AlertAction::Resolve) => self.resolved += 1,
                    None => {}
                }
            }
            CheckOutcome::Suppressed => self.suppressed += 1,
            CheckOutcome::InFlight | CheckOutcome::Disabled | CheckOutcome::Discarded => {
                self.skipped += 1
            }
        }
    }
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub code: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub status: HealthStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub services: usize,
    pub enabled_services: usize,
    pub failing_services: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_is_a_baseline() {
        assert_eq!(HealthStatus::Unknown.next(true), (HealthStatus::Healthy, None));
    }

    #[test]
    fn only_edges_alert() {
        assert_eq!(
            HealthStatus::Unknown.next(false),
            (HealthStatus::Failing, Some(AlertAction::Trigger))
        );
        assert_eq!(
            HealthStatus::Healthy.next(false),
            (HealthStatus::Failing, Some(AlertAction::Trigger))
        );
        assert_eq!(HealthStatus::Failing.next(false), (HealthStatus::Failing, None));
        assert_eq!(
            HealthStatus::Failing.next(true),
            (HealthStatus::Healthy, Some(AlertAction::Resolve))
        );
        assert_eq!(HealthStatus::Healthy.next(true), (HealthStatus::Healthy, None));
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = TickSummary::default();
        summary.record(CheckOutcome::Checked {
            status: HealthStatus::Failing,
            action: Some(AlertAction::Trigger),
        });
        summary.record(CheckOutcome::Disabled);
        summary.record(CheckOutcome::Suppressed);

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.failing, 1);
        assert_eq!(summary.triggered, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.suppressed, 1);
    }
}
