//! Identifier types shared with the host controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a network device (e.g., "of:0000000000000001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier from its URI form.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// Port number on a device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PortNumber(u64);

impl PortNumber {
    /// Creates a port number.
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Returns the raw port number.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PortNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

/// 802.1Q VLAN identifier (12 significant bits).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    /// The "no VLAN" tag.
    pub const NONE: VlanId = VlanId(0);

    /// Largest VLAN identifier that fits in the 12-bit field.
    pub const MAX_VLAN: u16 = 4095;

    /// Creates a VLAN identifier, returning `None` if it does not fit in
    /// 12 bits.
    pub const fn new(vid: u16) -> Option<Self> {
        if vid <= Self::MAX_VLAN {
            Some(Self(vid))
        } else {
            None
        }
    }

    /// Returns the raw tag value.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns true for the "no VLAN" tag.
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application identity issued by the host core service.
///
/// Used as the ownership tag of every rule an application installs, so that
/// all of them can be withdrawn in one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
    /// Numeric identifier assigned by the host.
    pub id: u16,
    /// Application name (e.g., "org.onosproject.velt").
    pub name: String,
}

impl ApplicationId {
    /// Creates an application identity.
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}

/// A device known to the host inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier.
    pub id: DeviceId,
}

impl Device {
    /// Creates a device entry.
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id() {
        let id = DeviceId::new("of:0000000000000001");
        assert_eq!(id.as_str(), "of:0000000000000001");
        assert_eq!(id.to_string(), "of:0000000000000001");
        assert_eq!(DeviceId::from("sw1"), DeviceId::new("sw1"));
    }

    #[test]
    fn test_vlan_id_range() {
        assert_eq!(VlanId::new(100).map(|v| v.value()), Some(100));
        assert_eq!(VlanId::new(4095).map(|v| v.value()), Some(4095));
        assert!(VlanId::new(4096).is_none());
        assert!(VlanId::NONE.is_none());
        assert!(!VlanId::new(1).unwrap().is_none());
    }

    #[test]
    fn test_application_id_display() {
        let app = ApplicationId::new(7, "org.onosproject.velt");
        assert_eq!(app.to_string(), "7:org.onosproject.velt");
    }

    #[test]
    fn test_port_number() {
        assert_eq!(PortNumber::new(3).value(), 3);
        assert_eq!(PortNumber::from(5u64).to_string(), "5");
        assert_eq!(PortNumber::default().value(), 0);
    }
}
