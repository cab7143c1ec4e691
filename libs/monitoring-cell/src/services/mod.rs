pub mod connectivity;
pub mod health;
pub mod probe;
pub mod registry;
pub mod scheduler;

pub use connectivity::{ConnectivityCheck, HttpConnectivityCheck};
pub use health::HealthMonitor;
pub use probe::{ProbePipeline, ProbeReport};
pub use registry::{MonitoredService, ServiceRegistry};
pub use scheduler::{TickHandle, TickLoop};
