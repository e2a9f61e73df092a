//! Standalone host adapters
//!
//! Lets the daemon run without a controller: devices come from the command
//! line, configuration from a network-config JSON file, and forwarding
//! objectives are logged and kept in memory instead of being compiled.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use velt_common::{
    ApplicationId, ConfigEventKind, ConfigFactory, CoreService, Device, DeviceId, DeviceService,
    FlowObjectiveService, FlowRuleService, ForwardingObjective, ListenerId, NetworkConfigEvent,
    NetworkConfigListener, NetworkConfigRegistry, VeltError, VeltResult,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed device inventory
#[derive(Debug, Default)]
pub struct StaticDeviceService {
    devices: Vec<Device>,
}

impl StaticDeviceService {
    /// Creates an inventory holding the given device identifiers
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: ids
                .into_iter()
                .map(|id| Device::new(DeviceId::new(id)))
                .collect(),
        }
    }
}

impl DeviceService for StaticDeviceService {
    fn devices(&self) -> Vec<Device> {
        self.devices.clone()
    }
}

/// Objective sink that logs submissions and tracks them per owner
#[derive(Debug, Default)]
pub struct LoggingFlowObjectiveService {
    /// Installed objectives keyed by owning application id
    installed: Mutex<HashMap<u16, Vec<(DeviceId, ForwardingObjective)>>>,
}

impl LoggingFlowObjectiveService {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objectives currently held for an application
    pub fn installed_count(&self, app_id: &ApplicationId) -> usize {
        lock(&self.installed).get(&app_id.id).map_or(0, Vec::len)
    }
}

impl FlowObjectiveService for LoggingFlowObjectiveService {
    fn forward(&self, device_id: &DeviceId, objective: ForwardingObjective) -> Result<(), String> {
        let rendered = serde_json::to_string(&objective).map_err(|e| e.to_string())?;
        info!(device = %device_id, objective = %rendered, "Forwarding objective");

        lock(&self.installed)
            .entry(objective.app_id.id)
            .or_default()
            .push((device_id.clone(), objective));
        Ok(())
    }
}

impl FlowRuleService for LoggingFlowObjectiveService {
    fn remove_flow_rules_by_id(&self, app_id: &ApplicationId) {
        let removed = lock(&self.installed).remove(&app_id.id).unwrap_or_default();
        info!("Removed {} flow rules owned by {}", removed.len(), app_id);
    }
}

/// Local application id allocator
#[derive(Debug, Default)]
pub struct LocalCoreService {
    registered: Mutex<HashMap<String, ApplicationId>>,
}

impl LocalCoreService {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoreService for LocalCoreService {
    fn register_application(&self, name: &str) -> Result<ApplicationId, String> {
        let mut registered = lock(&self.registered);
        if let Some(existing) = registered.get(name) {
            return Ok(existing.clone());
        }
        let id = u16::try_from(registered.len() + 1)
            .map_err(|_| format!("application id space exhausted registering {}", name))?;
        let app_id = ApplicationId::new(id, name);
        registered.insert(name.to_string(), app_id.clone());
        Ok(app_id)
    }
}

/// Network configuration document: `{"apps": {<app>: {<key>: {...}}}}`
///
/// Other subject classes are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetcfgDocument {
    /// Application-scoped configuration
    #[serde(default)]
    pub apps: BTreeMap<String, BTreeMap<String, Value>>,
}

impl NetcfgDocument {
    /// Parses a document from JSON text
    pub fn parse(text: &str) -> VeltResult<Self> {
        serde_json::from_str(text).map_err(|e| VeltError::invalid_config("netcfg", e.to_string()))
    }

    fn get(&self, app: &str, key: &str) -> Option<&Value> {
        self.apps.get(app)?.get(key)
    }

    /// Events describing how `newer` differs from `self`
    fn diff(&self, newer: &NetcfgDocument) -> Vec<NetworkConfigEvent> {
        let mut events = Vec::new();
        for (app, keys) in &newer.apps {
            for (key, value) in keys {
                match self.get(app, key) {
                    None => events.push(NetworkConfigEvent::added(app, key)),
                    Some(old) if old != value => events.push(NetworkConfigEvent::updated(app, key)),
                    Some(_) => {}
                }
            }
        }
        for (app, keys) in &self.apps {
            for key in keys.keys() {
                if newer.get(app, key).is_none() {
                    events.push(NetworkConfigEvent::removed(app, key));
                }
            }
        }
        events
    }
}

/// Configuration registry backed by a network-config JSON file
pub struct NetcfgFileRegistry {
    path: PathBuf,
    document: Mutex<NetcfgDocument>,
    factories: Mutex<Vec<ConfigFactory>>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn NetworkConfigListener>)>>,
    next_listener: AtomicU64,
}

impl NetcfgFileRegistry {
    /// Loads the file at `path`
    pub fn open(path: impl AsRef<Path>) -> VeltResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = Self::read(&path)?;
        info!("Loaded network configuration from {}", path.display());
        Ok(Self {
            path,
            document: Mutex::new(document),
            factories: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        })
    }

    fn read(path: &Path) -> VeltResult<NetcfgDocument> {
        let text = fs::read_to_string(path)
            .map_err(|e| VeltError::invalid_config(path.display().to_string(), e.to_string()))?;
        NetcfgDocument::parse(&text)
    }

    /// Emits `ConfigAdded` for every stored object whose schema is registered
    pub fn announce_existing(&self) {
        let events: Vec<_> = {
            let document = lock(&self.document);
            document
                .apps
                .iter()
                .flat_map(|(app, keys)| {
                    keys.keys()
                        .map(move |key| NetworkConfigEvent::added(app, key))
                })
                .collect()
        };
        self.dispatch(events);
    }

    /// Re-reads the file and emits one event per changed object. Returns
    /// the number of changed objects, announced or not.
    pub fn reload(&self) -> VeltResult<usize> {
        let newer = Self::read(&self.path)?;
        let events = {
            let mut document = lock(&self.document);
            let events = document.diff(&newer);
            *document = newer;
            events
        };
        info!(
            "Reloaded network configuration from {}: {} change(s)",
            self.path.display(),
            events.len()
        );
        let count = events.len();
        self.dispatch(events);
        Ok(count)
    }

    fn is_registered(&self, config_key: &str) -> bool {
        lock(&self.factories)
            .iter()
            .any(|f| f.config_key == config_key)
    }

    /// Delivers events for registered schemas; listeners are called outside
    /// every lock.
    fn dispatch(&self, events: Vec<NetworkConfigEvent>) {
        let events: Vec<_> = events
            .into_iter()
            .filter(|event| {
                let registered = self.is_registered(&event.config_key);
                if !registered {
                    debug!("No schema registered for {}, not announcing", event.config_key);
                }
                registered
            })
            .collect();
        self.notify(events);
    }

    fn notify(&self, events: Vec<NetworkConfigEvent>) {
        let listeners: Vec<_> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for event in events {
            for listener in &listeners {
                listener.event(event.clone());
            }
        }
    }
}

impl NetworkConfigRegistry for NetcfgFileRegistry {
    fn register_config_factory(&self, factory: ConfigFactory) -> Result<(), String> {
        {
            let mut factories = lock(&self.factories);
            if factories.contains(&factory) {
                return Err(format!(
                    "config key {} already registered",
                    factory.config_key
                ));
            }
            factories.push(factory.clone());
        }
        self.notify(vec![NetworkConfigEvent::new(
            ConfigEventKind::ConfigRegistered,
            factory.subject_class,
            factory.config_key,
        )]);
        Ok(())
    }

    fn unregister_config_factory(&self, factory: &ConfigFactory) {
        let removed = {
            let mut factories = lock(&self.factories);
            let before = factories.len();
            factories.retain(|f| f != factory);
            before != factories.len()
        };
        if removed {
            self.notify(vec![NetworkConfigEvent::new(
                ConfigEventKind::ConfigUnregistered,
                factory.subject_class.clone(),
                factory.config_key.clone(),
            )]);
        } else {
            warn!("Config key {} was not registered", factory.config_key);
        }
    }

    fn add_listener(&self, listener: Arc<dyn NetworkConfigListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        lock(&self.listeners).retain(|(lid, _)| *lid != id);
    }

    fn get_config(&self, app_id: &ApplicationId, config_key: &str) -> Option<Value> {
        lock(&self.document).get(&app_id.name, config_key).cloned()
    }
}
