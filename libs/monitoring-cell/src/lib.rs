// =====================================================================================
// MONITORING CELL - SERVICE PROBING & HEALTH STATE
// =====================================================================================
//
// This cell owns everything that decides whether a service is healthy:
// - Service registry with short codes and per-service runtime state
// - Probe pipeline (status, JSON, latency, body size, certificate rules)
// - Internet connectivity confirmation before recording a failure
// - Edge-triggered health transitions that fan alerts out to channels
// - The tick loop driving all of the above, with an explicit shutdown
// - Read-only status routes
//
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export commonly used types
pub use error::{MonitoringError, ProbeError};
pub use models::{CheckOutcome, HealthStatus, ServiceState, ServiceStatus, TickSummary};

pub use services::{
    ConnectivityCheck, HealthMonitor, HttpConnectivityCheck, MonitoredService, ProbePipeline,
    ServiceRegistry, TickHandle, TickLoop,
};

pub use handlers::MonitoringHandlers;
pub use router::create_monitoring_router;
