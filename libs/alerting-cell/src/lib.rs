// =====================================================================================
// ALERTING CELL - ALERT DISPATCH TO EXTERNAL CHANNELS
// =====================================================================================
//
// One alert, many backends:
// - `AlertDispatcher` is the Trigger/Resolve capability every channel implements
// - `IncidentApiClient` posts incident events (PagerDuty-compatible)
// - `SmsDispatcher` texts every recipient of the affected service
// - `ChannelRegistry` maps configured channel instances to dispatchers
// - `fan_out` delivers to all bound channels independently
//
// =====================================================================================

pub mod error;
pub mod models;
pub mod services;

pub use error::DispatchError;
pub use models::{AlertAction, ChannelKind, DispatchReport, IncidentEvent};
pub use services::{
    fan_out, AlertChannel, AlertDispatcher, ChannelRegistry, IncidentApiClient, SmsClient,
    SmsDispatcher, TextMessenger,
};
