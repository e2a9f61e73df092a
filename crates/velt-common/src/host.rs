//! Capabilities the host controller provides to applications.
//!
//! Calls are synchronous and fire-and-forget from the application's point
//! of view: a submission that is accepted has only been queued by the host.

use std::sync::Arc;

use serde_json::Value;

use crate::flow::ForwardingObjective;
use crate::netcfg::{ConfigFactory, ListenerId, NetworkConfigListener};
use crate::types::{ApplicationId, Device, DeviceId};

/// Device inventory.
pub trait DeviceService: Send + Sync {
    /// Lists every device currently known to the host.
    fn devices(&self) -> Vec<Device>;

    /// Returns true if a device with this identifier is known.
    fn contains_device(&self, device_id: &DeviceId) -> bool {
        self.devices().iter().any(|d| &d.id == device_id)
    }
}

/// Forwarding objective submission.
pub trait FlowObjectiveService: Send + Sync {
    /// Submits an objective for a device. `Err` means the host rejected it
    /// outright; `Ok` only means it was accepted for compilation.
    fn forward(&self, device_id: &DeviceId, objective: ForwardingObjective) -> Result<(), String>;
}

/// Flow rule bookkeeping.
pub trait FlowRuleService: Send + Sync {
    /// Removes every rule owned by the application.
    fn remove_flow_rules_by_id(&self, app_id: &ApplicationId);
}

/// Application identity registry.
pub trait CoreService: Send + Sync {
    /// Registers an application name and returns its identity. Registering
    /// the same name twice returns the same identity.
    fn register_application(&self, name: &str) -> Result<ApplicationId, String>;
}

/// Network configuration registry.
pub trait NetworkConfigRegistry: Send + Sync {
    /// Registers a configuration schema.
    fn register_config_factory(&self, factory: ConfigFactory) -> Result<(), String>;

    /// Unregisters a configuration schema.
    fn unregister_config_factory(&self, factory: &ConfigFactory);

    /// Subscribes a listener to configuration events.
    fn add_listener(&self, listener: Arc<dyn NetworkConfigListener>) -> ListenerId;

    /// Cancels a subscription.
    fn remove_listener(&self, id: ListenerId);

    /// Returns the configuration object stored for an application under a
    /// schema key, if any.
    fn get_config(&self, app_id: &ApplicationId, config_key: &str) -> Option<Value>;
}

/// Bundle of host capabilities injected into an application.
#[derive(Clone)]
pub struct HostServices {
    /// Device inventory.
    pub device_service: Arc<dyn DeviceService>,
    /// Objective submission.
    pub flow_objective_service: Arc<dyn FlowObjectiveService>,
    /// Rule withdrawal.
    pub flow_rule_service: Arc<dyn FlowRuleService>,
    /// Application identity registry.
    pub core_service: Arc<dyn CoreService>,
    /// Configuration registry.
    pub config_registry: Arc<dyn NetworkConfigRegistry>,
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDevices(Vec<Device>);

    impl DeviceService for FixedDevices {
        fn devices(&self) -> Vec<Device> {
            self.0.clone()
        }
    }

    #[test]
    fn test_contains_device() {
        let svc = FixedDevices(vec![Device::new("sw1"), Device::new("sw2")]);
        assert!(svc.contains_device(&DeviceId::new("sw1")));
        assert!(svc.contains_device(&DeviceId::new("sw2")));
        assert!(!svc.contains_device(&DeviceId::new("sw3")));
    }

    #[test]
    fn test_contains_device_empty_inventory() {
        let svc = FixedDevices(vec![]);
        assert!(!svc.contains_device(&DeviceId::new("sw1")));
    }
}
