//! Flow rule population for the VLAN-swap service chain
//!
//! Site-tagged traffic from the uplink is steered to VM1 and temp-tagged
//! traffic to VM2. What each VM sends back is retagged with the other VLAN
//! on its way out of the uplink. Four rules implement this on the bridge:
//!
//! | # | in port | in VLAN | rewrite | out port |
//! |---|---------|---------|---------|----------|
//! | 1 | uplink  | site    | -       | VM1      |
//! | 2 | VM2     | site    | temp    | uplink   |
//! | 3 | uplink  | temp    | -       | VM2      |
//! | 4 | VM1     | temp    | site    | uplink   |

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use velt_common::{
    ApplicationId, DeviceService, FlowObjectiveService, ForwardingFlag, ForwardingObjective,
    PortNumber, TrafficSelector, TrafficTreatment, VlanId,
};

use crate::types::{ConfigSnapshot, PopulateOutcome};

/// One port/VLAN steering rule before it becomes a forwarding objective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanSwapRule {
    /// Ingress port
    pub in_port: PortNumber,
    /// VLAN matched on ingress
    pub in_vlan: VlanId,
    /// VLAN written before output, if any
    pub rewrite: Option<VlanId>,
    /// Egress port
    pub out_port: PortNumber,
}

impl VlanSwapRule {
    fn new(in_port: PortNumber, out_port: PortNumber, in_vlan: VlanId, out_vlan: VlanId) -> Self {
        // A zero target tag means "leave the tag alone"
        let rewrite = Some(out_vlan).filter(|vlan| !vlan.is_none());
        Self {
            in_port,
            in_vlan,
            rewrite,
            out_port,
        }
    }

    /// Builds the permanent, versatile forwarding objective for this rule
    pub fn to_objective(&self, priority: i32, app_id: &ApplicationId) -> ForwardingObjective {
        let mut treatment = TrafficTreatment::output(self.out_port);
        if let Some(vlan) = self.rewrite {
            treatment = treatment.with_vlan_id(vlan);
        }

        ForwardingObjective::new(
            TrafficSelector::new(self.in_port, self.in_vlan),
            treatment,
            app_id.clone(),
        )
        .with_priority(priority)
        .with_flag(ForwardingFlag::Versatile)
        .make_permanent()
    }
}

/// The four steering rules derived from a configuration snapshot
pub fn vlan_swap_rules(snapshot: &ConfigSnapshot) -> [VlanSwapRule; 4] {
    let uplink = snapshot.data_plane_port;
    let vm1 = snapshot.vm_port_1;
    let vm2 = snapshot.vm_port_2;
    let site = snapshot.site_vlan;
    let temp = snapshot.temp_vlan;

    [
        VlanSwapRule::new(uplink, vm1, site, VlanId::NONE),
        VlanSwapRule::new(vm2, uplink, site, temp),
        VlanSwapRule::new(uplink, vm2, temp, VlanId::NONE),
        VlanSwapRule::new(vm1, uplink, temp, site),
    ]
}

/// The four forwarding objectives derived from a configuration snapshot
pub fn vlan_swap_objectives(
    snapshot: &ConfigSnapshot,
    app_id: &ApplicationId,
) -> [ForwardingObjective; 4] {
    vlan_swap_rules(snapshot).map(|rule| rule.to_objective(snapshot.default_priority, app_id))
}

/// Installs the VLAN-swap rules on the configured bridge
pub struct FlowRulesPopulator {
    device_service: Arc<dyn DeviceService>,
    flow_objective_service: Arc<dyn FlowObjectiveService>,
}

impl FlowRulesPopulator {
    /// Creates a populator over the host's inventory and objective services
    pub fn new(
        device_service: Arc<dyn DeviceService>,
        flow_objective_service: Arc<dyn FlowObjectiveService>,
    ) -> Self {
        Self {
            device_service,
            flow_objective_service,
        }
    }

    /// Runs one installation pass.
    ///
    /// Nothing is installed unless the bridge is currently known to the
    /// device inventory. Every pass submits all four rules; deduplication is
    /// left to the host.
    #[instrument(skip(self, snapshot), fields(bridge = ?snapshot.bridge_id))]
    pub fn populate(&self, snapshot: &ConfigSnapshot, app_id: &ApplicationId) -> PopulateOutcome {
        let Some(device_id) = snapshot.device_id() else {
            debug!("No bridge configured, skipping flow rule population");
            return PopulateOutcome::NoBridge;
        };

        if !self.device_service.contains_device(&device_id) {
            debug!("Bridge {} not among known devices, skipping", device_id);
            return PopulateOutcome::DeviceNotFound;
        }

        info!("Populate flow rule for: {}", device_id);

        let mut submitted = 0;
        let mut rejected = 0;
        for objective in vlan_swap_objectives(snapshot, app_id) {
            let selector = objective.selector.clone();
            match self.flow_objective_service.forward(&device_id, objective) {
                Ok(()) => submitted += 1,
                Err(e) => {
                    warn!(
                        "Forwarding objective in_port={} vlan={} rejected by {}: {}",
                        selector.in_port, selector.vlan_id, device_id, e
                    );
                    rejected += 1;
                }
            }
        }

        PopulateOutcome::Installed {
            submitted,
            rejected,
        }
    }
}
