// UI module - GUI logic and event loop bridge
//
// This module contains:
// - EventLoopBridge: Hands work from tokio tasks (the SIGINT listener) to the Slint event loop
// - LogPoller: Drains the log mailbox into the console on a repeating timer
// - GuiController: Main controller that wires the window to the panel and the lifecycle

pub mod bridge;
pub mod controller;
pub mod poller;

pub use bridge::EventLoopBridge;
pub use controller::GuiController;
pub use poller::{LogPoller, LogSurface, RepeatingTask};
