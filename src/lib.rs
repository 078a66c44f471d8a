// RigPanel - control panel for a trigger-gated acquisition rig
//
// This is the library crate containing the device collaborators, the log
// bridge and the GUI plumbing. The binary crate (main.rs) wires them together.

pub mod config;
pub mod logging;
pub mod models;
pub mod panel;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::RigConfig;
pub use panel::{CommandPanel, PanelAction, PanelError};
pub use state::{Lifecycle, ShellState, ShutdownTrigger};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
