//! Health checking for the remote service
//!
//! Three independent probes (service, network, authentication) feed a
//! latest-result map owned by the [`HealthCheckManager`], which derives one
//! status per concern from it on demand.

pub mod manager;
pub mod probes;
pub mod status;
pub mod types;

pub use manager::{DerivedStatuses, HealthCheckManager, HealthCheckSettings};
pub use probes::{AuthenticationProbe, NetworkProbe, Probe, ProbeSet, ServiceProbe};
pub use status::StatusThresholds;
pub use types::{
    AuthState, AuthenticationStatus, NetworkState, NetworkStatus, ProbeDetails, ProbeKind,
    ProbeOutcome, ProbeResult, ServiceState, ServiceStatus,
};
