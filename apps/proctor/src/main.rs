use proctor::collaborators::{LogNotifier, RouteTracker};
use proctor::error::ProctorError;
use proctor::logger::initialize as LoggerInitialize;

use proctor_core::bus::Bus;
use proctor_core::config::BusConfig;
use proctor_core::error::CoreError;
use proctor_core::shell::{EventShell, Navigator, Notifier, OfflineMonitor};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};

const APP_DIR_NAME: &str = "proctor";

#[tokio::main]
async fn main() -> Result<(), ProctorError> {
    let log_dir = app_dir(dirs::data_local_dir(), "data")?.join("logs");
    create_dir_all(&log_dir).map_err(|e| ProctorError::Proctor {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Proctor client starting");
    info!("Log directory: {}", log_dir.display());

    let config_dir = app_dir(dirs::config_dir(), "config")?;
    let config = BusConfig::load(&config_dir).map_err(CoreError::from)?;

    let bus = Bus::new(&config).map_err(CoreError::from)?;

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let navigator = Arc::new(RouteTracker::default());
    let shell = EventShell::install(
        &bus,
        Arc::clone(&notifier),
        navigator.clone() as Arc<dyn Navigator>,
    );
    let monitor = OfflineMonitor::spawn(&bus, Arc::clone(&notifier));

    if let Err(e) = bus.connect().await {
        error!("Could not reach the desktop bridge: {e}");
        shell.teardown();
        monitor.stop();
        return Err(CoreError::from(e).into());
    }

    info!("Proctor client running, press Ctrl+C to exit");

    let signal = tokio::signal::ctrl_c().await;

    shell.teardown();
    monitor.stop();
    bus.close().await;

    info!(
        "Proctor client stopped on screen {}",
        navigator.current().as_deref().unwrap_or("(none)")
    );

    signal.map_err(|e| ProctorError::Proctor {
        message: format!("Failed to listen for Ctrl+C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf, ProctorError> {
    base.map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| ProctorError::Proctor {
            message: format!("Failed to resolve the {kind} directory"),
            location: ErrorLocation::from(Location::caller()),
        })
}
