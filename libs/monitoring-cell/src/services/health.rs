// =====================================================================================
// HEALTH MONITORING SERVICE
// =====================================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use alerting_cell::{fan_out, AlertAction};
use shared_models::Alert;

use crate::error::ProbeError;
use crate::models::CheckOutcome;
use crate::services::{ConnectivityCheck, MonitoredService, ProbePipeline};

pub struct HealthMonitor {
    probe: ProbePipeline,
    connectivity: Arc<dyn ConnectivityCheck>,
}

impl HealthMonitor {
    pub fn new(probe: ProbePipeline, connectivity: Arc<dyn ConnectivityCheck>) -> Self {
        Self {
            probe,
            connectivity,
        }
    }

    /// Probes one service, applies the result to its state and alerts on edges.
    ///
    /// A failure is only recorded when the internet is independently reachable.
    /// Alerts are dispatched after the state lock is released so inbound
    /// commands are never blocked behind a slow provider.
    #[instrument(skip_all, fields(service = %service.code))]
    pub async fn check_service(&self, service: &MonitoredService) -> CheckOutcome {
        let Some(_running) = service.try_begin_check() else {
            debug!("Previous check still running, skipping");
            return CheckOutcome::InFlight;
        };

        if !service.is_enabled().await {
            return CheckOutcome::Disabled;
        }

        let result = self.probe.run(&service.url, &service.rules).await;

        if let Err(e) = &result {
            if !self.connectivity.is_online().await {
                warn!(error = %e, "Probe failed but there is no internet connection, not alerting");
                return CheckOutcome::Suppressed;
            }
        }

        let (status, action) = {
            let mut state = service.lock_state().await;
            if !state.enabled {
                info!("Service was disabled during the check, discarding result");
                return CheckOutcome::Discarded;
            }

            let (status, action) = state.last_result.next(result.is_ok());
            state.last_result = status;
            state.last_checked = Some(Utc::now());
            state.last_error = result.as_ref().err().map(ToString::to_string);
            (status, action)
        };

        if let Some(action) = action {
            let alert = Alert::new(alert_message(&service.name, action, result.as_ref().err()));
            fan_out(&service.channels, action, &service.subject(), &alert).await;
        }

        CheckOutcome::Checked { status, action }
    }
}

fn alert_message(name: &str, action: AlertAction, error: Option<&ProbeError>) -> String {
    match (action, error) {
        (AlertAction::Trigger, Some(e)) => format!("{name}: {e}."),
        (AlertAction::Trigger, None) => format!("{name}: is failing."),
        (AlertAction::Resolve, _) => format!("{name}: is healthy."),
    }
}
