//! RigPanel - control panel for a trigger-gated acquisition rig
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation, console output and the GUI log bridge)
//! - Tokio async runtime (hosts the SIGINT listener)
//! - Device handles (USB-1608FS and the Arduino trace controller)
//! - GUI controller ([`GuiController`] - wires the window to the command panel)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop and every device call
//! - **Tokio workers**: Wait on OS signals and hand shutdown back to the GUI thread
//!
//! # Execution Flow
//!
//! 1. Load `RigPanel Data/rigpanel.yaml` (defaults if missing)
//! 2. Build the log bridge and install the global subscriber → logs/rigpanel.<date>
//! 3. Create tokio runtime with 2 worker threads
//! 4. Open the DAQ and the serial port; either may fail (degraded mode)
//! 5. Create GuiController and run the Slint event loop
//! 6. Shutdown tokio runtime with 5s timeout

use anyhow::Result;
use rigpanel::logging::{self, LineFormatter};
use rigpanel::services::{DataLogger, TraceController};
use rigpanel::ui::GuiController;
use rigpanel::{APP_NAME, CommandPanel, ConfigManager, Lifecycle, VERSION};
use std::sync::Arc;
use std::time::Duration;

/// Directory holding `rigpanel.yaml`
const CONFIG_DIR: &str = "RigPanel Data";

const WORKER_THREADS: usize = 2;

/// Main entry point for the RigPanel GUI application
///
/// # Errors
///
/// This function can fail if:
/// - The configuration file is not valid YAML
/// - Logging initialization fails (disk space, permissions)
/// - Tokio runtime creation fails (system resources)
/// - Slint UI initialization fails (graphics drivers, display)
///
/// Missing devices are not errors; the panel starts without them.
fn main() -> Result<()> {
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    // Records logged from here on queue up for the GUI console
    let (queue_layer, console_feed) =
        logging::bridge(LineFormatter::new(config.console.line_format.clone()));
    let _log_guard = logging::setup_logging(&config.logging, queue_layer)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::debug!("Configuration loaded from {}", config_manager.config_path());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(WORKER_THREADS)
        .thread_name("rigpanel-worker")
        .build()?;

    tracing::info!(
        "Tokio runtime initialized with {} worker threads",
        WORKER_THREADS
    );

    let daq = DataLogger::open(&config.daq)
        .inspect_err(|e| tracing::warn!("Continuing without DAQ: {}", e))
        .ok();
    let trace = TraceController::open(&config.serial)
        .inspect_err(|e| tracing::warn!("Continuing without trace controller: {}", e))
        .ok();

    let lifecycle = Arc::new(Lifecycle::new());
    let gui_controller = GuiController::new(
        CommandPanel::new(daq, trace).with_serial_port(config.serial.port.as_str()),
        console_feed,
        &config,
        Arc::clone(&lifecycle),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until a shutdown trigger quits the event loop
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
