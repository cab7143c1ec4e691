use tracing::{info, warn};

use alerting_cell::TextMessenger;
use monitoring_cell::ServiceRegistry;
use shared_models::Owner;

pub fn welcome_message(owner: &Owner, services: usize) -> String {
    let noun = if services == 1 { "service" } else { "services" };
    format!(
        "Hi {}! You will receive alerts for {services} {noun} on Watchtower. \
         Stop alerts by texting 'stop <ID>', start alerts with 'start <ID>'",
        owner.name
    )
}

/// Texts every owner once. Returns how many welcomes were delivered.
pub async fn welcome_owners(registry: &ServiceRegistry, messenger: &dyn TextMessenger) -> usize {
    let mut delivered = 0;
    for owner in registry.owners() {
        let services = registry.services_owned_by(&owner.cell).len();
        match messenger
            .send_text(&owner.cell, &welcome_message(&owner, services))
            .await
        {
            Ok(()) => delivered += 1,
            Err(e) => warn!(owner = %owner.name, error = %e, "Failed to welcome owner"),
        }
    }
    info!(delivered, "Welcome messages sent");
    delivered
}
