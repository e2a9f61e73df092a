//! Network configuration events, schema factories and listeners.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject class of application-scoped configuration.
pub const APP_SUBJECT_CLASS: &str = "apps";

/// Kind of change reported by the configuration registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigEventKind {
    /// A configuration object was added.
    ConfigAdded,
    /// A configuration object was replaced.
    ConfigUpdated,
    /// A configuration object was removed.
    ConfigRemoved,
    /// A configuration schema was registered.
    ConfigRegistered,
    /// A configuration schema was unregistered.
    ConfigUnregistered,
}

impl ConfigEventKind {
    /// Returns the event kind name as used in controller logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigEventKind::ConfigAdded => "CONFIG_ADDED",
            ConfigEventKind::ConfigUpdated => "CONFIG_UPDATED",
            ConfigEventKind::ConfigRemoved => "CONFIG_REMOVED",
            ConfigEventKind::ConfigRegistered => "CONFIG_REGISTERED",
            ConfigEventKind::ConfigUnregistered => "CONFIG_UNREGISTERED",
        }
    }

    /// Returns true if the event carries new configuration content.
    pub fn carries_content(&self) -> bool {
        matches!(
            self,
            ConfigEventKind::ConfigAdded | ConfigEventKind::ConfigUpdated
        )
    }
}

impl fmt::Display for ConfigEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigEvent {
    /// What changed.
    pub kind: ConfigEventKind,
    /// Subject the configuration is attached to (an application name for
    /// the `apps` subject class).
    pub subject: String,
    /// Schema key identifying the configuration class (e.g., "veltcfg").
    pub config_key: String,
}

impl NetworkConfigEvent {
    /// Creates an event.
    pub fn new(
        kind: ConfigEventKind,
        subject: impl Into<String>,
        config_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            config_key: config_key.into(),
        }
    }

    /// Creates a `ConfigAdded` event.
    pub fn added(subject: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::new(ConfigEventKind::ConfigAdded, subject, config_key)
    }

    /// Creates a `ConfigUpdated` event.
    pub fn updated(subject: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::new(ConfigEventKind::ConfigUpdated, subject, config_key)
    }

    /// Creates a `ConfigRemoved` event.
    pub fn removed(subject: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::new(ConfigEventKind::ConfigRemoved, subject, config_key)
    }
}

/// Describes a configuration schema an application registers with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigFactory {
    /// Subject class the schema attaches to.
    pub subject_class: String,
    /// Schema key.
    pub config_key: String,
}

impl ConfigFactory {
    /// Creates an application-scoped schema with the given key.
    pub fn app(config_key: impl Into<String>) -> Self {
        Self {
            subject_class: APP_SUBJECT_CLASS.to_string(),
            config_key: config_key.into(),
        }
    }
}

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Receiver of configuration change notifications.
///
/// Implementations must return quickly: the registry calls them on its own
/// notification path.
pub trait NetworkConfigListener: Send + Sync {
    /// Handles one configuration event.
    fn event(&self, event: NetworkConfigEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(ConfigEventKind::ConfigAdded.as_str(), "CONFIG_ADDED");
        assert_eq!(ConfigEventKind::ConfigRemoved.to_string(), "CONFIG_REMOVED");
    }

    #[test]
    fn test_carries_content() {
        assert!(ConfigEventKind::ConfigAdded.carries_content());
        assert!(ConfigEventKind::ConfigUpdated.carries_content());
        assert!(!ConfigEventKind::ConfigRemoved.carries_content());
        assert!(!ConfigEventKind::ConfigRegistered.carries_content());
        assert!(!ConfigEventKind::ConfigUnregistered.carries_content());
    }

    #[test]
    fn test_event_constructors() {
        let ev = NetworkConfigEvent::updated("org.onosproject.velt", "veltcfg");
        assert_eq!(ev.kind, ConfigEventKind::ConfigUpdated);
        assert_eq!(ev.subject, "org.onosproject.velt");
        assert_eq!(ev.config_key, "veltcfg");
    }

    #[test]
    fn test_app_factory() {
        let factory = ConfigFactory::app("veltcfg");
        assert_eq!(factory.subject_class, "apps");
        assert_eq!(factory.config_key, "veltcfg");
    }
}
