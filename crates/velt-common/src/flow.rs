//! Forwarding objective descriptions.
//!
//! A forwarding objective is a declarative match/action intent handed to the
//! host's flow-objective service, which compiles it into device-specific flow
//! entries. Only the match fields and actions needed for port/VLAN steering
//! are modelled.

use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, PortNumber, VlanId};

/// Match criteria of a forwarding objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSelector {
    /// Ingress port.
    pub in_port: PortNumber,
    /// VLAN tag carried on ingress.
    pub vlan_id: VlanId,
}

impl TrafficSelector {
    /// Creates a selector matching an ingress port and VLAN tag.
    pub fn new(in_port: PortNumber, vlan_id: VlanId) -> Self {
        Self { in_port, vlan_id }
    }
}

/// Actions applied to matching traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficTreatment {
    /// VLAN tag to write before output, if any.
    pub set_vlan_id: Option<VlanId>,
    /// Egress port.
    pub output: PortNumber,
}

impl TrafficTreatment {
    /// Creates a treatment that outputs on a port without touching the tag.
    pub fn output(output: PortNumber) -> Self {
        Self {
            set_vlan_id: None,
            output,
        }
    }

    /// Rewrites the VLAN tag before output.
    pub fn with_vlan_id(mut self, vlan_id: VlanId) -> Self {
        self.set_vlan_id = Some(vlan_id);
        self
    }
}

/// How the host should place the objective in the device pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardingFlag {
    /// Destination-based forwarding tables.
    Specific,
    /// Generic match tables (ACL-like).
    Versatile,
}

/// Whether the objective adds or removes forwarding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveOperation {
    /// Install the objective.
    Add,
    /// Withdraw the objective.
    Remove,
}

/// A complete forwarding objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingObjective {
    /// Match criteria.
    pub selector: TrafficSelector,
    /// Actions.
    pub treatment: TrafficTreatment,
    /// Rule priority.
    pub priority: i32,
    /// Pipeline placement.
    pub flag: ForwardingFlag,
    /// Owning application.
    pub app_id: ApplicationId,
    /// True if the rule never expires.
    pub permanent: bool,
    /// Idle timeout in seconds (ignored when permanent).
    pub timeout: u32,
    /// Add or remove.
    pub op: ObjectiveOperation,
}

impl ForwardingObjective {
    /// Creates an `Add` objective with priority 0, the `Specific` flag and
    /// no timeout.
    pub fn new(
        selector: TrafficSelector,
        treatment: TrafficTreatment,
        app_id: ApplicationId,
    ) -> Self {
        Self {
            selector,
            treatment,
            priority: 0,
            flag: ForwardingFlag::Specific,
            app_id,
            permanent: false,
            timeout: 0,
            op: ObjectiveOperation::Add,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the pipeline placement flag.
    pub fn with_flag(mut self, flag: ForwardingFlag) -> Self {
        self.flag = flag;
        self
    }

    /// Marks the objective as never expiring.
    pub fn make_permanent(mut self) -> Self {
        self.permanent = true;
        self.timeout = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vlan(v: u16) -> VlanId {
        VlanId::new(v).unwrap()
    }

    #[test]
    fn test_objective_defaults() {
        let obj = ForwardingObjective::new(
            TrafficSelector::new(PortNumber::new(1), vlan(100)),
            TrafficTreatment::output(PortNumber::new(2)),
            ApplicationId::new(1, "test"),
        );
        assert_eq!(obj.priority, 0);
        assert_eq!(obj.flag, ForwardingFlag::Specific);
        assert!(!obj.permanent);
        assert_eq!(obj.op, ObjectiveOperation::Add);
        assert_eq!(obj.treatment.set_vlan_id, None);
    }

    #[test]
    fn test_objective_builder_chain() {
        let obj = ForwardingObjective::new(
            TrafficSelector::new(PortNumber::new(3), vlan(100)),
            TrafficTreatment::output(PortNumber::new(1)).with_vlan_id(vlan(200)),
            ApplicationId::new(1, "test"),
        )
        .with_priority(50)
        .with_flag(ForwardingFlag::Versatile)
        .make_permanent();

        assert_eq!(obj.priority, 50);
        assert_eq!(obj.flag, ForwardingFlag::Versatile);
        assert!(obj.permanent);
        assert_eq!(obj.timeout, 0);
        assert_eq!(obj.treatment.set_vlan_id, Some(vlan(200)));
    }
}
