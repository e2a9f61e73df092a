//! veltd - VLAN-swap flow populator daemon
//!
//! Runs the velt application against the standalone host adapters: a static
//! device inventory, a network-config JSON file and a logging objective sink.
//! SIGHUP reloads the file; SIGINT/SIGTERM deactivate the application, which
//! withdraws every rule it installed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use velt_common::{HostServices, NetworkApp};
use veltd::standalone::{
    LocalCoreService, LoggingFlowObjectiveService, NetcfgFileRegistry, StaticDeviceService,
};
use veltd::{VeltApp, APP_NAME};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// VLAN-swap flow populator
#[derive(Parser, Debug)]
#[command(name = "veltd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network configuration file (`{"apps": {"<app>": {"veltcfg": {...}}}}`)
    #[arg(short = 'c', long)]
    network_config: PathBuf,

    /// Device known to the inventory (repeatable)
    #[arg(short = 'd', long = "device")]
    devices: Vec<String>,

    /// Application name to register
    #[arg(long, default_value = APP_NAME)]
    app_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Initializes tracing; RUST_LOG takes precedence over `--log-level`
fn init_logging(log_level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().with_target(true).json())
            .init(),
    }
}

/// Waits for signals until asked to stop
async fn serve(app: &dyn NetworkApp, registry: &NetcfgFileRegistry) -> anyhow::Result<()> {
    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    info!("{} is {}, waiting for signals", app.app_name(), app.state().as_str());
    loop {
        tokio::select! {
            _ = hangup.recv() => match registry.reload() {
                Ok(changes) => info!("SIGHUP: {} configuration change(s)", changes),
                Err(e) => warn!("SIGHUP: keeping previous configuration: {}", e),
            },
            _ = terminate.recv() => {
                info!("Received SIGTERM");
                return Ok(());
            }
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for SIGINT")?;
                info!("Received SIGINT");
                return Ok(());
            }
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let registry = Arc::new(
        NetcfgFileRegistry::open(&args.network_config).with_context(|| {
            format!(
                "loading network configuration {}",
                args.network_config.display()
            )
        })?,
    );
    let flows = Arc::new(LoggingFlowObjectiveService::new());

    if args.devices.is_empty() {
        warn!("No devices given; no flow rules will be installed");
    }

    let services = HostServices {
        device_service: Arc::new(StaticDeviceService::from_ids(args.devices)),
        flow_objective_service: flows.clone(),
        flow_rule_service: flows,
        core_service: Arc::new(LocalCoreService::new()),
        config_registry: registry.clone(),
    };

    let mut app = VeltApp::with_app_name(services, args.app_name);
    app.activate().await?;
    registry.announce_existing();

    let served = serve(&app, &registry).await;
    app.deactivate().await?;
    served
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    info!("--- Starting veltd ---");

    match run(args).await {
        Ok(()) => {
            info!("veltd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("veltd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
