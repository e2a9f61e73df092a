//! Test fixtures for velt configuration scenarios
//!
//! Provides reusable veltcfg objects, network-config documents and events

use serde_json::{json, Map, Value};
use velt_common::{ConfigEventKind, NetworkConfigEvent};

/// Application name used by the fixtures
pub const APP: &str = "org.onosproject.velt";

/// Schema key used by the fixtures
pub const CONFIG_KEY: &str = "veltcfg";

/// Bridge named by [`standard_config`]
pub const STANDARD_BRIDGE: &str = "sw1";

/// Uplink port of [`standard_config`]
pub const STANDARD_UPLINK: u64 = 1;

/// First VM port of [`standard_config`]
pub const STANDARD_VM1: u64 = 2;

/// Second VM port of [`standard_config`]
pub const STANDARD_VM2: u64 = 3;

/// Site VLAN of [`standard_config`]
pub const STANDARD_SITE_VLAN: u16 = 100;

/// Temporary VLAN of [`standard_config`]
pub const STANDARD_TEMP_VLAN: u16 = 200;

/// Priority of [`standard_config`]
pub const STANDARD_PRIORITY: i32 = 50;

/// Builder for veltcfg objects
#[derive(Debug, Clone, Default)]
pub struct VeltConfigBuilder {
    fields: Map<String, Value>,
}

impl VeltConfigBuilder {
    /// Starts from an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`standard_config`]
    pub fn standard() -> Self {
        match standard_config() {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Sets a field to any JSON value
    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Removes a field
    pub fn without_field(mut self, field: &str) -> Self {
        self.fields.remove(field);
        self
    }

    /// Finishes the object
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Bridge `sw1`, uplink 1, VMs on 2 and 3, VLANs 100/200, priority 50
pub fn standard_config() -> Value {
    json!({
        "bridgeId": STANDARD_BRIDGE,
        "dataPlanePort": STANDARD_UPLINK,
        "vmPort1": STANDARD_VM1,
        "vmPort2": STANDARD_VM2,
        "siteVlan": STANDARD_SITE_VLAN,
        "tempVlan": STANDARD_TEMP_VLAN,
        "defaultPriority": STANDARD_PRIORITY,
    })
}

/// Same as [`standard_config`] with every number written as a string
pub fn string_typed_config() -> Value {
    json!({
        "bridgeId": STANDARD_BRIDGE,
        "dataPlanePort": STANDARD_UPLINK.to_string(),
        "vmPort1": STANDARD_VM1.to_string(),
        "vmPort2": STANDARD_VM2.to_string(),
        "siteVlan": STANDARD_SITE_VLAN.to_string(),
        "tempVlan": STANDARD_TEMP_VLAN.to_string(),
        "defaultPriority": STANDARD_PRIORITY.to_string(),
    })
}

/// Network-config document holding one object for one application
pub fn netcfg_document(app: &str, config_key: &str, config: Value) -> Value {
    json!({ "apps": { app: { config_key: config } } })
}

/// CONFIG_ADDED for the fixture application and schema
pub fn added() -> NetworkConfigEvent {
    NetworkConfigEvent::added(APP, CONFIG_KEY)
}

/// CONFIG_UPDATED for the fixture application and schema
pub fn updated() -> NetworkConfigEvent {
    NetworkConfigEvent::updated(APP, CONFIG_KEY)
}

/// CONFIG_REMOVED for the fixture application and schema
pub fn removed() -> NetworkConfigEvent {
    NetworkConfigEvent::removed(APP, CONFIG_KEY)
}

/// Event of any kind for the fixture application under another schema key
pub fn foreign(kind: ConfigEventKind, config_key: &str) -> NetworkConfigEvent {
    NetworkConfigEvent::new(kind, APP, config_key)
}
