// Shell lifecycle
//
// The application shell has two states, Running and Terminating. Window
// close, Ctrl+Q and SIGINT all funnel into `Lifecycle::request_shutdown`,
// which performs the transition once and flips the cancel token watched by
// the console poller.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::watch;

/// Lifecycle states of the application shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Running,
    Terminating,
}

/// What asked the shell to shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    WindowClose,
    KeyboardShortcut,
    Interrupt,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownTrigger::WindowClose => "window close",
            ShutdownTrigger::KeyboardShortcut => "Ctrl+Q",
            ShutdownTrigger::Interrupt => "interrupt signal",
        })
    }
}

const RUNNING: u8 = 0;
const TERMINATING: u8 = 1;

/// Thread-safe Running → Terminating state machine with a cancel token.
///
/// # Usage
///
/// - [`request_shutdown()`](Self::request_shutdown) from any trigger; only the
///   first call returns `true` and should perform teardown
/// - [`cancel_token()`](Self::cancel_token) for tasks that must stop when the
///   shell tears down (the console poller)
pub struct Lifecycle {
    state: AtomicU8,
    cancel_tx: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(RUNNING),
            cancel_tx,
        }
    }

    pub fn state(&self) -> ShellState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ShellState::Running,
            _ => ShellState::Terminating,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ShellState::Running
    }

    /// Receiver that turns `true` once shutdown has been requested.
    pub fn cancel_token(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Move to Terminating.
    ///
    /// # Returns
    /// `true` if this call performed the transition, `false` if the shell was
    /// already terminating
    pub fn request_shutdown(&self, trigger: ShutdownTrigger) -> bool {
        let transitioned = self
            .state
            .compare_exchange(RUNNING, TERMINATING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if transitioned {
            tracing::info!("Shutdown requested by {}", trigger);
            self.cancel_tx.send_replace(true);
        } else {
            tracing::debug!("Shutdown already in progress, ignoring {}", trigger);
        }

        transitioned
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
