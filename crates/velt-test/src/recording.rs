//! In-memory host that records every call made against it

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use velt_common::{
    ApplicationId, ConfigFactory, CoreService, Device, DeviceId, DeviceService,
    FlowObjectiveService, FlowRuleService, ForwardingObjective, HostServices, ListenerId,
    NetworkConfigEvent, NetworkConfigListener, NetworkConfigRegistry,
};

/// One call received by the recording host
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `CoreService::register_application`
    RegisterApplication(String),
    /// `NetworkConfigRegistry::register_config_factory`
    RegisterConfigFactory(ConfigFactory),
    /// `NetworkConfigRegistry::unregister_config_factory`
    UnregisterConfigFactory(ConfigFactory),
    /// `NetworkConfigRegistry::add_listener`
    AddListener(ListenerId),
    /// `NetworkConfigRegistry::remove_listener`
    RemoveListener(ListenerId),
    /// `NetworkConfigRegistry::get_config`
    GetConfig {
        /// Application name the config was requested for
        app: String,
        /// Schema key
        config_key: String,
    },
    /// `DeviceService::devices`
    Devices,
    /// `FlowObjectiveService::forward`
    Forward(DeviceId, ForwardingObjective),
    /// `FlowRuleService::remove_flow_rules_by_id`
    RemoveFlowRulesById(ApplicationId),
}

#[derive(Default)]
struct Inner {
    calls: Vec<HostCall>,
    devices: Vec<Device>,
    configs: HashMap<(String, String), Value>,
    listeners: Vec<(ListenerId, Arc<dyn NetworkConfigListener>)>,
    app_ids: HashMap<String, ApplicationId>,
    next_listener: u64,
    reject_submissions: bool,
    fail_factory_registration: bool,
    lookup_delay: Option<Duration>,
}

/// Host double implementing every capability trait
///
/// All state sits behind one mutex; listeners are always invoked after the
/// lock is released.
#[derive(Default)]
pub struct RecordingHost {
    inner: Mutex<Inner>,
}

impl RecordingHost {
    /// Creates an empty host
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("recording host poisoned")
    }

    /// Adds a device to the inventory
    pub fn with_device(self: Arc<Self>, id: &str) -> Arc<Self> {
        self.add_device(id);
        self
    }

    /// Stores a configuration object for an application and schema key
    pub fn with_config(self: Arc<Self>, app: &str, config_key: &str, config: Value) -> Arc<Self> {
        self.set_config(app, config_key, config);
        self
    }

    /// Adds a device to the inventory
    pub fn add_device(&self, id: &str) {
        self.inner().devices.push(Device::new(id));
    }

    /// Removes a device from the inventory
    pub fn remove_device(&self, id: &str) {
        self.inner().devices.retain(|d| d.id.as_str() != id);
    }

    /// Replaces the configuration object for an application and schema key
    pub fn set_config(&self, app: &str, config_key: &str, config: Value) {
        self.inner()
            .configs
            .insert((app.to_string(), config_key.to_string()), config);
    }

    /// Makes every subsequent `forward` call fail
    pub fn reject_submissions(&self, reject: bool) {
        self.inner().reject_submissions = reject;
    }

    /// Makes every subsequent schema registration fail
    pub fn fail_factory_registration(&self, fail: bool) {
        self.inner().fail_factory_registration = fail;
    }

    /// Blocks every device lookup for `delay` after recording it, keeping
    /// an installation pass in flight
    pub fn delay_device_lookups(&self, delay: Duration) {
        self.inner().lookup_delay = Some(delay);
    }

    /// Bundles this host as the full set of host services
    pub fn services(self: &Arc<Self>) -> HostServices {
        HostServices {
            device_service: self.clone(),
            flow_objective_service: self.clone(),
            flow_rule_service: self.clone(),
            core_service: self.clone(),
            config_registry: self.clone(),
        }
    }

    /// Delivers an event to every subscribed listener
    pub fn emit(&self, event: NetworkConfigEvent) {
        let listeners: Vec<_> = self
            .inner()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener.event(event.clone());
        }
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<HostCall> {
        self.inner().calls.clone()
    }

    /// Every submitted objective, accepted or rejected, in order
    pub fn forwarded(&self) -> Vec<(DeviceId, ForwardingObjective)> {
        self.inner()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Forward(dev, obj) => Some((dev.clone(), obj.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of `get_config` calls
    pub fn config_reads(&self) -> usize {
        self.count(|call| matches!(call, HostCall::GetConfig { .. }))
    }

    /// Number of `remove_flow_rules_by_id` calls
    pub fn withdrawals(&self) -> usize {
        self.count(|call| matches!(call, HostCall::RemoveFlowRulesById(_)))
    }

    /// Number of currently subscribed listeners
    pub fn listener_count(&self) -> usize {
        self.inner().listeners.len()
    }

    /// Position of the first call matching `pred`
    pub fn position(&self, pred: impl Fn(&HostCall) -> bool) -> Option<usize> {
        self.inner().calls.iter().position(pred)
    }

    fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.inner().calls.iter().filter(|call| pred(*call)).count()
    }

    fn record(&self, call: HostCall) {
        self.inner().calls.push(call);
    }
}

impl DeviceService for RecordingHost {
    fn devices(&self) -> Vec<Device> {
        let (devices, delay) = {
            let mut inner = self.inner();
            inner.calls.push(HostCall::Devices);
            (inner.devices.clone(), inner.lookup_delay)
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        devices
    }
}

impl FlowObjectiveService for RecordingHost {
    fn forward(&self, device_id: &DeviceId, objective: ForwardingObjective) -> Result<(), String> {
        let mut inner = self.inner();
        inner
            .calls
            .push(HostCall::Forward(device_id.clone(), objective));
        if inner.reject_submissions {
            Err(format!("{} rejected the objective", device_id))
        } else {
            Ok(())
        }
    }
}

impl FlowRuleService for RecordingHost {
    fn remove_flow_rules_by_id(&self, app_id: &ApplicationId) {
        self.record(HostCall::RemoveFlowRulesById(app_id.clone()));
    }
}

impl CoreService for RecordingHost {
    fn register_application(&self, name: &str) -> Result<ApplicationId, String> {
        let mut inner = self.inner();
        inner
            .calls
            .push(HostCall::RegisterApplication(name.to_string()));
        let next_id = inner.app_ids.len() as u16 + 1;
        Ok(inner
            .app_ids
            .entry(name.to_string())
            .or_insert_with(|| ApplicationId::new(next_id, name))
            .clone())
    }
}

impl NetworkConfigRegistry for RecordingHost {
    fn register_config_factory(&self, factory: ConfigFactory) -> Result<(), String> {
        let mut inner = self.inner();
        inner
            .calls
            .push(HostCall::RegisterConfigFactory(factory.clone()));
        if inner.fail_factory_registration {
            Err(format!("cannot register {}", factory.config_key))
        } else {
            Ok(())
        }
    }

    fn unregister_config_factory(&self, factory: &ConfigFactory) {
        self.record(HostCall::UnregisterConfigFactory(factory.clone()));
    }

    fn add_listener(&self, listener: Arc<dyn NetworkConfigListener>) -> ListenerId {
        let mut inner = self.inner();
        inner.next_listener += 1;
        let id = ListenerId(inner.next_listener);
        inner.listeners.push((id, listener));
        inner.calls.push(HostCall::AddListener(id));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut inner = self.inner();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.calls.push(HostCall::RemoveListener(id));
    }

    fn get_config(&self, app_id: &ApplicationId, config_key: &str) -> Option<Value> {
        let mut inner = self.inner();
        inner.calls.push(HostCall::GetConfig {
            app: app_id.name.clone(),
            config_key: config_key.to_string(),
        });
        inner
            .configs
            .get(&(app_id.name.clone(), config_key.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl NetworkConfigListener for Counter {
        fn event(&self, _event: NetworkConfigEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_register_application_is_stable() {
        let host = RecordingHost::new();
        let a = host.register_application("a").unwrap();
        let b = host.register_application("b").unwrap();
        assert_eq!(host.register_application("a").unwrap(), a);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_emit_reaches_subscribed_listeners_only() {
        let host = RecordingHost::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let id = host.add_listener(counter.clone());

        host.emit(NetworkConfigEvent::added("app", "cfg"));
        host.remove_listener(id);
        host.emit(NetworkConfigEvent::added("app", "cfg"));

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_get_config_records_read() {
        let host = RecordingHost::new().with_config("app", "cfg", json!({"a": 1}));
        let app = ApplicationId::new(1, "app");

        assert_eq!(host.get_config(&app, "cfg"), Some(json!({"a": 1})));
        assert_eq!(host.get_config(&app, "other"), None);
        assert_eq!(host.config_reads(), 2);
    }

    #[test]
    fn test_device_inventory_changes() {
        let host = RecordingHost::new().with_device("sw1");
        assert!(host.contains_device(&DeviceId::new("sw1")));
        host.remove_device("sw1");
        assert!(!host.contains_device(&DeviceId::new("sw1")));
    }
}
