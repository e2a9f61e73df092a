//! VeltApp - application lifecycle and configuration event handling
//!
//! Lifecycle:
//! 1. `activate` registers the application identity and the veltcfg schema,
//!    starts the event worker and subscribes to configuration events
//! 2. While active, every added/updated veltcfg event reloads the
//!    configuration and re-runs the flow rule population
//! 3. `deactivate` stops the worker, withdraws every rule owned by the
//!    application, then unsubscribes and unregisters the schema
//!
//! Events are handed from the registry's notification path to a single
//! worker task through an unbounded channel, so the notifier never blocks
//! and installation passes never overlap.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use velt_common::{
    AppState, ApplicationId, ConfigFactory, HostServices, ListenerId, NetworkApp,
    NetworkConfigEvent, NetworkConfigListener, NetworkConfigRegistry, VeltError, VeltResult,
};

use crate::config::VeltConfig;
use crate::populator::FlowRulesPopulator;
use crate::tables::{APP_NAME, CONFIG_KEY};
use crate::types::{PopulateOutcome, WorkerStats};

/// Registry listener that queues events for the worker
struct ChannelListener {
    tx: mpsc::UnboundedSender<NetworkConfigEvent>,
}

impl NetworkConfigListener for ChannelListener {
    fn event(&self, event: NetworkConfigEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            debug!(
                "Event worker stopped, dropping {} for {}",
                event.kind, event.config_key
            );
        }
    }
}

/// Serializes installation passes against teardown.
///
/// A pass runs with the gate held. Once closed, no further pass starts, and
/// `close` returns only after the in-flight one has finished submitting.
#[derive(Default)]
struct PassGate {
    closed: Mutex<bool>,
}

impl PassGate {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `pass` unless the gate is closed; `None` when skipped
    fn run<T>(&self, pass: impl FnOnce() -> T) -> Option<T> {
        let closed = self.lock();
        if *closed {
            return None;
        }
        let result = pass();
        drop(closed);
        Some(result)
    }

    fn close(&self) {
        *self.lock() = true;
    }
}

/// Host registrations held while active
struct ActiveState {
    app_id: ApplicationId,
    listener_id: ListenerId,
    shutdown: oneshot::Sender<()>,
    worker: JoinHandle<()>,
    gate: Arc<PassGate>,
}

/// VeltApp installs the VLAN-swap rules described by the veltcfg
/// configuration on the configured bridge
pub struct VeltApp {
    /// Name registered with the core service
    app_name: String,

    /// Injected host capabilities
    services: HostServices,

    /// Configuration schema registered while active
    factory: ConfigFactory,

    /// Present only while active
    active: Option<ActiveState>,

    /// Worker progress, kept across activations
    stats: Arc<watch::Sender<WorkerStats>>,
}

impl VeltApp {
    /// Creates an inactive application registering as `org.onosproject.velt`
    pub fn new(services: HostServices) -> Self {
        Self::with_app_name(services, APP_NAME)
    }

    /// Creates an inactive application registering under another name
    pub fn with_app_name(services: HostServices, app_name: impl Into<String>) -> Self {
        let (stats, _) = watch::channel(WorkerStats::default());
        Self {
            app_name: app_name.into(),
            services,
            factory: ConfigFactory::app(CONFIG_KEY),
            active: None,
            stats: Arc::new(stats),
        }
    }

    /// Identity issued by the core service, while active
    pub fn app_id(&self) -> Option<&ApplicationId> {
        self.active.as_ref().map(|active| &active.app_id)
    }

    /// Subscribes to worker progress counters
    pub fn stats(&self) -> watch::Receiver<WorkerStats> {
        self.stats.subscribe()
    }

    /// Withdraws owned rules, then drops the subscription and the schema.
    /// Rule withdrawal always happens first.
    fn release(&self, app_id: &ApplicationId, listener_id: ListenerId) {
        self.services.flow_rule_service.remove_flow_rules_by_id(app_id);
        self.services.config_registry.remove_listener(listener_id);
        self.services
            .config_registry
            .unregister_config_factory(&self.factory);
    }
}

#[async_trait]
impl NetworkApp for VeltApp {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn config_key(&self) -> &str {
        &self.factory.config_key
    }

    fn state(&self) -> AppState {
        if self.active.is_some() {
            AppState::Active
        } else {
            AppState::Inactive
        }
    }

    async fn activate(&mut self) -> VeltResult<()> {
        if self.active.is_some() {
            return Err(VeltError::already_active(&self.app_name));
        }

        let app_id = self
            .services
            .core_service
            .register_application(&self.app_name)
            .map_err(|e| VeltError::registration("core", e))?;

        self.services
            .config_registry
            .register_config_factory(self.factory.clone())
            .map_err(|e| VeltError::registration("netcfg", e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let gate = Arc::new(PassGate::default());
        let worker = ConfigEventWorker {
            app_id: app_id.clone(),
            config_key: self.factory.config_key.clone(),
            registry: Arc::clone(&self.services.config_registry),
            populator: FlowRulesPopulator::new(
                Arc::clone(&self.services.device_service),
                Arc::clone(&self.services.flow_objective_service),
            ),
            stats: Arc::clone(&self.stats),
            gate: Arc::clone(&gate),
        };
        let worker = tokio::spawn(worker.run(rx, shutdown_rx));

        let listener_id = self
            .services
            .config_registry
            .add_listener(Arc::new(ChannelListener { tx }));

        info!("Started {} as {}", self.app_name, app_id);
        self.active = Some(ActiveState {
            app_id,
            listener_id,
            shutdown: shutdown_tx,
            worker,
            gate,
        });
        Ok(())
    }

    async fn deactivate(&mut self) -> VeltResult<()> {
        let Some(active) = self.active.take() else {
            return Err(VeltError::not_active(&self.app_name));
        };
        let ActiveState {
            app_id,
            listener_id,
            shutdown,
            worker,
            ..
        } = active;

        // The worker may already be gone; the in-flight pass finishes first
        let _ = shutdown.send(());
        let joined = worker.await;

        self.release(&app_id, listener_id);
        joined.map_err(|e| VeltError::worker(e.to_string()))?;

        info!("Stopped {}", self.app_name);
        Ok(())
    }
}

impl Drop for VeltApp {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!(
                "{} dropped while active, withdrawing rules owned by {}",
                self.app_name, active.app_id
            );
            // abort() only lands at the worker's next await; a pass already
            // running must finish before its rules can be withdrawn
            active.worker.abort();
            active.gate.close();
            self.release(&active.app_id, active.listener_id);
        }
    }
}

/// Single consumer of configuration events
struct ConfigEventWorker {
    app_id: ApplicationId,
    config_key: String,
    registry: Arc<dyn NetworkConfigRegistry>,
    populator: FlowRulesPopulator,
    stats: Arc<watch::Sender<WorkerStats>>,
    gate: Arc<PassGate>,
}

impl ConfigEventWorker {
    async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<NetworkConfigEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        debug!("Event worker started for {}", self.app_id);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Some(event) => {
                        if self.gate.run(|| self.handle_event(event)).is_none() {
                            debug!("Teardown in progress, dropping queued event");
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        debug!("Event worker stopped for {}", self.app_id);
    }

    fn handle_event(&self, event: NetworkConfigEvent) {
        let mut delta = WorkerStats {
            events_processed: 1,
            ..Default::default()
        };

        if event.config_key != self.config_key {
            info!(
                "Ignoring {} for foreign config key {}",
                event.kind, event.config_key
            );
            delta.events_ignored = 1;
        } else if !event.kind.carries_content() {
            debug!("Ignoring {} for {}", event.kind, event.config_key);
            delta.events_ignored = 1;
        } else if let Some(outcome) = self.read_configuration() {
            delta.passes_run = 1;
            delta.rules_submitted = outcome.submitted() as u64;
        }

        self.stats.send_modify(|stats| {
            stats.events_processed += delta.events_processed;
            stats.events_ignored += delta.events_ignored;
            stats.passes_run += delta.passes_run;
            stats.rules_submitted += delta.rules_submitted;
        });
    }

    /// Reloads the configuration and re-runs population. `None` when no
    /// configuration object is stored.
    fn read_configuration(&self) -> Option<PopulateOutcome> {
        let Some(value) = self.registry.get_config(&self.app_id, &self.config_key) else {
            debug!("No configuration found");
            return None;
        };

        info!("Load velt configurations");
        let config = VeltConfig::from_value(value);
        let unknown = config.unknown_fields();
        if !unknown.is_empty() {
            warn!("Ignoring unknown {} fields: {:?}", self.config_key, unknown);
        }

        let snapshot = config.snapshot();
        let outcome = self.populator.populate(&snapshot, &self.app_id);
        match outcome {
            PopulateOutcome::Installed {
                submitted,
                rejected,
            } => info!(
                "Complete populating flow rules: {} submitted, {} rejected",
                submitted, rejected
            ),
            PopulateOutcome::DeviceNotFound | PopulateOutcome::NoBridge => {
                debug!("No flow rules populated: {:?}", outcome)
            }
        }
        Some(outcome)
    }
}
