//! veltd - VLAN-swap flow populator for an SDN controller
//!
//! Reads the `veltcfg` application configuration (bridge, uplink port, two
//! VM ports, site and temp VLANs, priority) and installs four permanent
//! forwarding objectives that steer traffic between the uplink and the two
//! VM ports, swapping VLAN tags on the way back out.

mod app;
mod config;
mod populator;
pub mod standalone;
mod tables;
mod types;

pub use app::VeltApp;
pub use config::VeltConfig;
pub use populator::{vlan_swap_objectives, vlan_swap_rules, FlowRulesPopulator, VlanSwapRule};
pub use tables::*;
pub use types::*;
