//! Registration names and configuration field keys for veltd

/// Name registered with the core service; also the ownership tag of every
/// installed rule
pub const APP_NAME: &str = "org.onosproject.velt";

/// Configuration schema key under the `apps` subject class
pub const CONFIG_KEY: &str = "veltcfg";

/// Field names
pub mod fields {
    /// Target switch identifier
    pub const BRIDGE_ID: &str = "bridgeId";

    /// Uplink port
    pub const DATA_PLANE_PORT: &str = "dataPlanePort";

    /// First VM-facing port
    pub const VM_PORT_1: &str = "vmPort1";

    /// Second VM-facing port
    pub const VM_PORT_2: &str = "vmPort2";

    /// VLAN used on the uplink side
    pub const SITE_VLAN: &str = "siteVlan";

    /// VLAN used between the VM ports
    pub const TEMP_VLAN: &str = "tempVlan";

    /// Priority of every installed rule
    pub const DEFAULT_PRIORITY: &str = "defaultPriority";

    /// All recognised field names
    pub const ALL: [&str; 7] = [
        BRIDGE_ID,
        DATA_PLANE_PORT,
        VM_PORT_1,
        VM_PORT_2,
        SITE_VLAN,
        TEMP_VLAN,
        DEFAULT_PRIORITY,
    ];
}
