//! Type definitions for veltd

use velt_common::{DeviceId, PortNumber, VlanId};

/// Fully read configuration, rebuilt on every configuration event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Target switch identifier
    pub bridge_id: Option<String>,
    /// Uplink port
    pub data_plane_port: PortNumber,
    /// First VM-facing port
    pub vm_port_1: PortNumber,
    /// Second VM-facing port
    pub vm_port_2: PortNumber,
    /// VLAN used on the uplink side
    pub site_vlan: VlanId,
    /// VLAN used between the VM ports
    pub temp_vlan: VlanId,
    /// Priority of every installed rule
    pub default_priority: i32,
}

impl ConfigSnapshot {
    /// Target device, if a non-empty bridge identifier is configured
    pub fn device_id(&self) -> Option<DeviceId> {
        self.bridge_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(DeviceId::new)
    }
}

/// Outcome of one rule installation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Rules were submitted to the target device
    Installed {
        /// Submissions the host accepted
        submitted: usize,
        /// Submissions the host rejected
        rejected: usize,
    },
    /// The bridge is not among the known devices
    DeviceNotFound,
    /// No bridge identifier is configured
    NoBridge,
}

impl PopulateOutcome {
    /// Returns the number of accepted submissions
    pub fn submitted(&self) -> usize {
        match self {
            PopulateOutcome::Installed { submitted, .. } => *submitted,
            _ => 0,
        }
    }
}

/// Progress counters of the configuration event worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Events taken off the queue
    pub events_processed: u64,
    /// Events skipped for foreign schema or kind
    pub events_ignored: u64,
    /// Installation passes attempted
    pub passes_run: u64,
    /// Objectives accepted by the host
    pub rules_submitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_from_bridge() {
        let snapshot = ConfigSnapshot {
            bridge_id: Some("of:0000000000000001".to_string()),
            ..Default::default()
        };
        assert_eq!(
            snapshot.device_id(),
            Some(DeviceId::new("of:0000000000000001"))
        );
    }

    #[test]
    fn test_device_id_missing_or_empty() {
        assert_eq!(ConfigSnapshot::default().device_id(), None);

        let empty = ConfigSnapshot {
            bridge_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.device_id(), None);
    }

    #[test]
    fn test_populate_outcome_submitted() {
        let outcome = PopulateOutcome::Installed {
            submitted: 3,
            rejected: 1,
        };
        assert_eq!(outcome.submitted(), 3);
        assert_eq!(PopulateOutcome::DeviceNotFound.submitted(), 0);
        assert_eq!(PopulateOutcome::NoBridge.submitted(), 0);
    }
}
