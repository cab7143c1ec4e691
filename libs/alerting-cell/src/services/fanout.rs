use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

use shared_models::{Alert, AlertSubject};

use crate::models::{AlertAction, DispatchReport};
use crate::services::AlertChannel;

/// Delivers `alert` to every channel concurrently. A failing channel is
/// logged and reported but never stops delivery to the others.
pub async fn fan_out(
    channels: &[Arc<AlertChannel>],
    action: AlertAction,
    subject: &AlertSubject,
    alert: &Alert,
) -> DispatchReport {
    let deliveries = channels.iter().map(|channel| async move {
        let result = match action {
            AlertAction::Trigger => channel.dispatcher.trigger(subject, alert).await,
            AlertAction::Resolve => channel.dispatcher.resolve(subject, alert).await,
        };
        (channel.name.clone(), result)
    });

    let mut report = DispatchReport::default();
    for (name, result) in join_all(deliveries).await {
        match result {
            Ok(()) => report.delivered.push(name),
            Err(e) => {
                error!(
                    channel = %name,
                    service = %subject.code,
                    action = ?action,
                    alert_id = %alert.id,
                    error = %e,
                    "Alert dispatch failed"
                );
                report.failed.push((name, e.to_string()));
            }
        }
    }

    info!(
        service = %subject.code,
        action = ?action,
        delivered = report.delivered.len(),
        failed = report.failed.len(),
        "Alert fan-out finished"
    );

    report
}
