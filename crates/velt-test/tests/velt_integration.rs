//! End-to-end tests: configuration events in, forwarding objectives out

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use velt_common::{ApplicationId, ConfigEventKind, HostServices, NetworkApp, NetworkConfigRegistry};
use velt_test::fixtures::{self, VeltConfigBuilder, APP, CONFIG_KEY};
use velt_test::{standard_rules, ExpectedRule, FlowVerifier, RecordingHost};
use veltd::standalone::{
    LocalCoreService, LoggingFlowObjectiveService, NetcfgFileRegistry, StaticDeviceService,
};
use veltd::{VeltApp, WorkerStats};

async fn wait_processed(app: &VeltApp, count: u64) -> WorkerStats {
    let mut rx = app.stats();
    let stats = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.events_processed >= count),
    )
    .await
    .expect("timed out waiting for the event worker")
    .expect("stats channel closed");
    *stats
}

async fn active_app(host: &Arc<RecordingHost>) -> VeltApp {
    let mut app = VeltApp::new(host.services());
    app.activate().await.unwrap();
    app
}

#[tokio::test]
async fn test_standard_config_installs_four_rules() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::added());
    wait_processed(&app, 1).await;

    let app_id = app.app_id().cloned().unwrap();
    let verifier = FlowVerifier::new(&host);
    verifier.assert_forward_count(4).unwrap();
    verifier
        .assert_rules(fixtures::STANDARD_BRIDGE, &standard_rules())
        .unwrap();
    verifier
        .assert_all_owned(&app_id, fixtures::STANDARD_PRIORITY)
        .unwrap();

    app.deactivate().await.unwrap();
    verifier.assert_teardown_order().unwrap();
    assert_eq!(host.withdrawals(), 1);
}

#[tokio::test]
async fn test_string_typed_numbers_are_accepted() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::string_typed_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::updated());
    wait_processed(&app, 1).await;

    FlowVerifier::new(&host)
        .assert_rules(fixtures::STANDARD_BRIDGE, &standard_rules())
        .unwrap();

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_unknown_bridge_installs_nothing() {
    let host = RecordingHost::new()
        .with_device("sw2")
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::added());
    let stats = wait_processed(&app, 1).await;

    assert_eq!(stats.passes_run, 1);
    assert_eq!(stats.rules_submitted, 0);
    assert!(host.forwarded().is_empty());

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_bridge_appearing_later_is_picked_up_on_next_event() {
    let host = RecordingHost::new().with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::added());
    wait_processed(&app, 1).await;
    assert!(host.forwarded().is_empty());

    host.add_device(fixtures::STANDARD_BRIDGE);
    host.emit(fixtures::updated());
    wait_processed(&app, 2).await;
    assert_eq!(host.forwarded().len(), 4);

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_removed_and_foreign_events_touch_nothing() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::removed());
    host.emit(fixtures::foreign(ConfigEventKind::ConfigAdded, "othercfg"));
    host.emit(fixtures::foreign(ConfigEventKind::ConfigUpdated, "othercfg"));
    let stats = wait_processed(&app, 3).await;

    assert_eq!(stats.events_ignored, 3);
    assert_eq!(host.config_reads(), 0);
    assert!(host.forwarded().is_empty());
    assert_eq!(host.withdrawals(), 0);

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_back_to_back_updates_apply_in_order() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::updated());
    host.emit(fixtures::updated());
    let stats = wait_processed(&app, 2).await;

    assert_eq!(stats.passes_run, 2);
    assert_eq!(stats.rules_submitted, 8);
    let forwarded = host.forwarded();
    assert_eq!(forwarded.len(), 8);
    assert!(forwarded[..4] == forwarded[4..]);

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_updated_vlans_are_read_on_each_event() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;

    host.emit(fixtures::added());
    wait_processed(&app, 1).await;

    host.set_config(
        APP,
        CONFIG_KEY,
        VeltConfigBuilder::standard()
            .with_field("siteVlan", 300)
            .build(),
    );
    host.emit(fixtures::updated());
    wait_processed(&app, 2).await;

    let forwarded = host.forwarded();
    assert_eq!(forwarded.len(), 8);
    assert_eq!(forwarded[4].1.selector.vlan_id.value(), 300);
    assert_eq!(
        forwarded[7].1.treatment.set_vlan_id.map(|v| v.value()),
        Some(300)
    );

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_missing_fields_fall_back_to_defaults() {
    let host = RecordingHost::new().with_device(fixtures::STANDARD_BRIDGE).with_config(
        APP,
        CONFIG_KEY,
        VeltConfigBuilder::new()
            .with_field("bridgeId", fixtures::STANDARD_BRIDGE)
            .with_field("siteVlan", 100)
            .with_field("tempVlan", "not-a-number")
            .build(),
    );
    let mut app = active_app(&host).await;

    host.emit(fixtures::added());
    wait_processed(&app, 1).await;

    // Ports and priority fall back to 0. A zero tempVlan means rule 2 does
    // not retag; rule 4 still retags to siteVlan.
    let verifier = FlowVerifier::new(&host);
    verifier.assert_forward_count(4).unwrap();
    verifier
        .assert_rules(
            fixtures::STANDARD_BRIDGE,
            &[
                ExpectedRule::forward(0, 100, 0),
                ExpectedRule::forward(0, 0, 0),
            ],
        )
        .unwrap();
    let rewrites: Vec<_> = host
        .forwarded()
        .iter()
        .map(|(_, obj)| obj.treatment.set_vlan_id.map(|v| v.value()))
        .collect();
    assert_eq!(rewrites, vec![None, None, None, Some(100)]);
    assert!(host.forwarded().iter().all(|(_, obj)| obj.priority == 0));

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_events_after_deactivate_are_dropped() {
    let host = RecordingHost::new()
        .with_device(fixtures::STANDARD_BRIDGE)
        .with_config(APP, CONFIG_KEY, fixtures::standard_config());
    let mut app = active_app(&host).await;
    app.deactivate().await.unwrap();

    host.emit(fixtures::added());

    assert_eq!(host.listener_count(), 0);
    assert!(host.forwarded().is_empty());
    assert_eq!(*app.stats().borrow(), WorkerStats::default());
}

fn write_netcfg(file: &mut NamedTempFile, config: serde_json::Value) {
    let doc = fixtures::netcfg_document(APP, CONFIG_KEY, config);
    let file = file.as_file_mut();
    file.set_len(0).unwrap();
    std::io::Seek::rewind(file).unwrap();
    file.write_all(doc.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
}

#[tokio::test]
async fn test_netcfg_file_lifecycle() {
    let mut file = NamedTempFile::new().unwrap();
    write_netcfg(&mut file, fixtures::standard_config());

    let registry = Arc::new(NetcfgFileRegistry::open(file.path()).unwrap());
    let flows = Arc::new(LoggingFlowObjectiveService::new());
    let services = HostServices {
        device_service: Arc::new(StaticDeviceService::from_ids([fixtures::STANDARD_BRIDGE])),
        flow_objective_service: flows.clone(),
        flow_rule_service: flows.clone(),
        core_service: Arc::new(LocalCoreService::new()),
        config_registry: registry.clone(),
    };

    let mut app = VeltApp::new(services);
    app.activate().await.unwrap();
    let app_id = app.app_id().cloned().unwrap();

    registry.announce_existing();
    let stats = wait_processed(&app, 1).await;
    assert_eq!(stats.rules_submitted, 4);
    assert_eq!(flows.installed_count(&app_id), 4);

    // Unchanged file: nothing announced
    assert_eq!(registry.reload().unwrap(), 0);

    write_netcfg(
        &mut file,
        VeltConfigBuilder::standard()
            .with_field("tempVlan", 300)
            .build(),
    );
    assert_eq!(registry.reload().unwrap(), 1);
    let stats = wait_processed(&app, 2).await;
    assert_eq!(stats.passes_run, 2);
    assert_eq!(flows.installed_count(&app_id), 8);

    app.deactivate().await.unwrap();
    assert_eq!(flows.installed_count(&app_id), 0);
}

#[tokio::test]
async fn test_netcfg_other_app_is_not_announced() {
    let mut file = NamedTempFile::new().unwrap();
    let doc = fixtures::netcfg_document("org.example.other", CONFIG_KEY, fixtures::standard_config());
    file.write_all(doc.to_string().as_bytes()).unwrap();
    file.flush().unwrap();

    let registry = Arc::new(NetcfgFileRegistry::open(file.path()).unwrap());
    let flows = Arc::new(LoggingFlowObjectiveService::new());
    let services = HostServices {
        device_service: Arc::new(StaticDeviceService::from_ids([fixtures::STANDARD_BRIDGE])),
        flow_objective_service: flows.clone(),
        flow_rule_service: flows.clone(),
        core_service: Arc::new(LocalCoreService::new()),
        config_registry: registry.clone(),
    };

    let mut app = VeltApp::new(services);
    app.activate().await.unwrap();
    let app_id = app.app_id().cloned().unwrap();

    // The schema is registered, so the event is delivered, but the lookup
    // for this application finds nothing
    registry.announce_existing();
    let stats = wait_processed(&app, 1).await;
    assert_eq!(stats.passes_run, 0);
    assert_eq!(flows.installed_count(&app_id), 0);

    app.deactivate().await.unwrap();
}

#[tokio::test]
async fn test_invalid_netcfg_reload_keeps_previous_document() {
    let mut file = NamedTempFile::new().unwrap();
    write_netcfg(&mut file, fixtures::standard_config());
    let registry = NetcfgFileRegistry::open(file.path()).unwrap();

    let file = file.as_file_mut();
    file.set_len(0).unwrap();
    std::io::Seek::rewind(file).unwrap();
    file.write_all(b"{not json").unwrap();
    file.flush().unwrap();

    assert!(registry.reload().is_err());
    let stored = registry.get_config(&ApplicationId::new(1, APP), CONFIG_KEY);
    assert_eq!(stored, Some(fixtures::standard_config()));
}
