// EventLoopBridge - Coordinates between tokio async runtime and Slint event loop
//
// Slint owns the GUI thread; tokio hosts everything that waits on the OS. The
// bridge lets tokio tasks hand work back to the GUI thread, which is how the
// SIGINT listener reaches the window.

use slint::{ComponentHandle, Weak};
use std::future::Future;
use std::io;

/// Coordinates between tokio async runtime and Slint event loop
///
/// # Example
/// ```ignore
/// let runtime = tokio::runtime::Runtime::new()?;
/// let ui = MainWindow::new()?;
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone());
///
/// bridge.watch_interrupt(|ui| {
///     let _ = ui.hide();
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    /// Weak reference to the UI component to prevent circular references
    ui_weak: Weak<T>,

    /// Handle to the tokio runtime for spawning async tasks
    tokio_handle: tokio::runtime::Handle,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        Self {
            ui_weak: ui.as_weak(),
            tokio_handle,
        }
    }

    /// Spawn an async task on the tokio runtime
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    /// Run `on_interrupt` on the GUI thread when the process receives SIGINT.
    pub fn watch_interrupt<F>(&self, on_interrupt: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let ui_weak = self.ui_weak.clone();
        self.spawn_async(move || async move {
            forward_signal(tokio::signal::ctrl_c(), move || {
                queue_update(&ui_weak, on_interrupt);
            })
            .await;
        });
        tracing::debug!("Interrupt listener installed");
    }
}

/// Queue `update` to run on the event loop thread; dropped if the loop is gone.
fn queue_update<T, F>(ui_weak: &Weak<T>, update: F)
where
    T: ComponentHandle + 'static,
    F: FnOnce(&T) + Send + 'static,
{
    if let Err(e) = ui_weak.upgrade_in_event_loop(move |ui| update(&ui)) {
        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
    }
}

/// Wait for `signal`, then call `on_signal` once.
///
/// # Returns
/// `true` if the signal arrived, `false` if listening failed
pub async fn forward_signal<S, F>(signal: S, on_signal: F) -> bool
where
    S: Future<Output = io::Result<()>>,
    F: FnOnce(),
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Interrupt received");
            on_signal();
            true
        }
        Err(e) => {
            tracing::warn!("Could not listen for interrupt signal: {}", e);
            false
        }
    }
}
