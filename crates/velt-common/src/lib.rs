//! Common infrastructure for the velt VLAN-swap application.
//!
//! This crate holds everything the application shares with the SDN
//! controller that hosts it:
//!
//! - [`types`]: Device, port, VLAN and application identifiers
//! - [`flow`]: Traffic selectors, treatments and forwarding objectives
//! - [`netcfg`]: Network configuration events, factories and listeners
//! - [`host`]: Capability traits implemented by the host controller
//! - [`NetworkApp`]: Lifecycle trait for controller applications
//! - [`error`]: Error types for application operations
//!
//! # Architecture
//!
//! Applications follow this pattern:
//!
//! 1. Register an application identity with the core service
//! 2. Register a configuration schema and subscribe to config events
//! 3. Translate configuration into forwarding objectives for a device
//! 4. Withdraw every rule owned by the identity on shutdown
//!
//! The host controller is never reached through a global registry; its
//! capabilities are handed to the application as a [`HostServices`] bundle.

pub mod app;
pub mod error;
pub mod flow;
pub mod host;
pub mod netcfg;
pub mod types;

// Re-export commonly used items at crate root
pub use app::{AppState, NetworkApp};
pub use error::{VeltError, VeltResult};
pub use flow::{
    ForwardingFlag, ForwardingObjective, ObjectiveOperation, TrafficSelector, TrafficTreatment,
};
pub use host::{
    CoreService, DeviceService, FlowObjectiveService, FlowRuleService, HostServices,
    NetworkConfigRegistry,
};
pub use netcfg::{
    ConfigEventKind, ConfigFactory, ListenerId, NetworkConfigEvent, NetworkConfigListener,
};
pub use types::{ApplicationId, Device, DeviceId, PortNumber, VlanId};
