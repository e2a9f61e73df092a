//! VeltConfig - typed accessors over the veltcfg JSON object
//!
//! Every accessor is a best-effort read: a missing field yields the fallback
//! silently, a malformed one logs a warning and yields the fallback. Nothing
//! here returns an error.

use serde_json::{Map, Value};
use tracing::warn;

use velt_common::{PortNumber, VlanId};

use crate::tables::fields;
use crate::types::ConfigSnapshot;

/// Configuration object of the velt application
#[derive(Debug, Clone, Default)]
pub struct VeltConfig {
    object: Map<String, Value>,
}

impl VeltConfig {
    /// Wraps a configuration object. Anything other than a JSON object is
    /// treated as an empty configuration.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(object) => Self { object },
            other => {
                warn!("Configuration is not a JSON object: {}", other);
                Self::default()
            }
        }
    }

    /// Returns bridgeId, or `None` if absent or malformed
    pub fn bridge_id(&self) -> Option<String> {
        let node = self.object.get(fields::BRIDGE_ID)?;
        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => {
                warn!("Wrong bridgeID format {}", node);
                None
            }
        }
    }

    /// Returns dataPlanePort, or port 0
    pub fn data_plane_port(&self) -> PortNumber {
        self.port(fields::DATA_PLANE_PORT)
    }

    /// Returns vmPort1, or port 0
    pub fn vm_port_1(&self) -> PortNumber {
        self.port(fields::VM_PORT_1)
    }

    /// Returns vmPort2, or port 0
    pub fn vm_port_2(&self) -> PortNumber {
        self.port(fields::VM_PORT_2)
    }

    /// Returns siteVlan, or VLAN 0
    pub fn site_vlan(&self) -> VlanId {
        self.vlan(fields::SITE_VLAN)
    }

    /// Returns tempVlan, or VLAN 0
    pub fn temp_vlan(&self) -> VlanId {
        self.vlan(fields::TEMP_VLAN)
    }

    /// Returns defaultPriority, or 0
    pub fn default_priority(&self) -> i32 {
        self.integer::<i32>(fields::DEFAULT_PRIORITY, "priority")
            .unwrap_or(0)
    }

    /// Keys present in the object that this application does not read
    pub fn unknown_fields(&self) -> Vec<&str> {
        self.object
            .keys()
            .map(String::as_str)
            .filter(|key| !fields::ALL.contains(key))
            .collect()
    }

    /// Reads every field at once
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            bridge_id: self.bridge_id(),
            data_plane_port: self.data_plane_port(),
            vm_port_1: self.vm_port_1(),
            vm_port_2: self.vm_port_2(),
            site_vlan: self.site_vlan(),
            temp_vlan: self.temp_vlan(),
            default_priority: self.default_priority(),
        }
    }

    fn port(&self, key: &str) -> PortNumber {
        self.integer::<u64>(key, "port")
            .map(PortNumber::new)
            .unwrap_or_default()
    }

    fn vlan(&self, key: &str) -> VlanId {
        self.integer::<u16>(key, "vlan")
            .and_then(|vid| match VlanId::new(vid) {
                Some(vlan) => Some(vlan),
                None => {
                    warn!("Wrong vlan format {}: {} is out of range", key, vid);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Integer read shared by the numeric accessors. Accepts JSON integers
    /// and strings holding an integer; `None` when absent or malformed.
    fn integer<T: TryFrom<i64>>(&self, key: &str, kind: &str) -> Option<T> {
        let node = self.object.get(key)?;
        let parsed = match node {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed.and_then(|raw| T::try_from(raw).ok()) {
            Some(value) => Some(value),
            None => {
                warn!("Wrong {} format {}: {}", kind, key, node);
                None
            }
        }
    }
}

impl From<Value> for VeltConfig {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
