// GUI Controller - Bridges the Slint window with the rig
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - CommandPanel (device actions)
// - LogPoller (console rendering)
// - Lifecycle (shutdown from window close, Ctrl+Q and SIGINT)

use crate::logging::ConsoleFeed;
use crate::models::RigConfig;
use crate::panel::{CommandPanel, PanelAction};
use crate::state::{Lifecycle, ShutdownTrigger};
use crate::ui::bridge::EventLoopBridge;
use crate::ui::poller::{LineTone, LogPoller, LogSurface, RenderedLine, RepeatingTask};
use anyhow::{Context, Result};
use slint::{ComponentHandle, Model, ModelRc, VecModel, Weak};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

// Include the generated Slint code
slint::include_modules!();

impl From<LineTone> for LogTone {
    fn from(tone: LineTone) -> Self {
        match tone {
            LineTone::Muted => LogTone::Muted,
            LineTone::Default => LogTone::Normal,
            LineTone::Warn => LogTone::Warn,
            LineTone::Error => LogTone::Error,
        }
    }
}

/// The console list in the main window.
struct ConsoleView {
    lines: Rc<VecModel<LogLine>>,
    ui: Weak<MainWindow>,
    /// Zero keeps every line
    max_lines: usize,
}

impl LogSurface for ConsoleView {
    fn append_line(&mut self, line: RenderedLine) {
        self.lines.push(LogLine {
            text: line.text.into(),
            tag: line.style.tag.into(),
            tone: line.style.tone.into(),
            emphasized: line.style.emphasized,
        });

        if self.max_lines > 0 {
            let overflow = self.lines.row_count().saturating_sub(self.max_lines);
            for _ in 0..overflow {
                self.lines.remove(0);
            }
        }
    }

    fn scroll_to_end(&mut self) {
        if let Some(ui) = self.ui.upgrade() {
            ui.invoke_scroll_log_to_end();
        }
    }
}

/// GUI Controller that wires up the Slint UI with the devices and the console
///
/// # Example
/// ```ignore
/// let lifecycle = Arc::new(Lifecycle::new());
/// let controller = GuiController::new(
///     CommandPanel::new(daq, trace).with_serial_port(config.serial.port.as_str()),
///     console_feed,
///     &config,
///     lifecycle,
///     runtime.handle().clone(),
/// )?;
/// controller.run()?;  // Blocks until shutdown
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge carrying the SIGINT listener
    _bridge: EventLoopBridge<MainWindow>,

    /// Console poller, driven by a repeating GUI-thread timer
    poller: RepeatingTask,

    lifecycle: Arc<Lifecycle>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `panel` - Command panel owning whatever device handles were opened
    /// * `feed` - Mailbox reader and line formatter from the logging bridge
    /// * `config` - Rig configuration (console and panel sections are used)
    /// * `lifecycle` - Shared shell lifecycle
    /// * `tokio_handle` - Handle to the tokio runtime hosting the signal listener
    pub fn new(
        panel: CommandPanel,
        feed: ConsoleFeed,
        config: &RigConfig,
        lifecycle: Arc<Lifecycle>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle);

        ui.set_serial_command(config.panel.default_command.as_str().into());
        ui.set_serial_status(
            if panel.has_trace_controller() {
                format!("Arduino on {}", config.serial.port)
            } else {
                "Arduino not connected".to_string()
            }
            .into(),
        );
        ui.set_daq_status(
            if panel.has_daq() {
                "USB-1608FS connected"
            } else {
                "DAQ not connected"
            }
            .into(),
        );

        let poller = Self::start_console(&ui, feed, config, &lifecycle);
        Self::setup_callbacks(&ui, panel, &lifecycle);
        Self::setup_shutdown(&ui, &bridge, &lifecycle);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            poller,
            lifecycle,
        })
    }

    /// Run the GUI (blocks until the event loop quits)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.show()?;
        slint::run_event_loop()?;

        // The event loop can also end on its own when the last window closes
        self.poller.cancel();
        tracing::info!(
            "GUI event loop exited (shell {:?})",
            self.lifecycle.state()
        );
        Ok(())
    }

    /// Attach the mailbox reader to the console list and start polling.
    fn start_console(
        ui: &MainWindow,
        feed: ConsoleFeed,
        config: &RigConfig,
        lifecycle: &Lifecycle,
    ) -> RepeatingTask {
        let lines = Rc::new(VecModel::<LogLine>::default());
        ui.set_log_lines(ModelRc::from(Rc::clone(&lines)));

        let view = ConsoleView {
            lines,
            ui: ui.as_weak(),
            max_lines: config.console.max_lines,
        };
        let mut poller = LogPoller::new(feed.reader, feed.formatter, view, lifecycle.cancel_token());

        // Show whatever queued up before the window existed
        poller.drain();

        let period = config.console.poll_interval();
        tracing::debug!("Console poller running every {:?}", period);
        RepeatingTask::start(period, move || poller.tick())
    }

    /// Wire each button to one panel action.
    fn setup_callbacks(ui: &MainWindow, panel: CommandPanel, lifecycle: &Arc<Lifecycle>) {
        let panel = Rc::new(RefCell::new(panel));

        let dispatch = {
            let panel = Rc::clone(&panel);
            move |action: PanelAction| {
                tracing::debug!("{} clicked", action);
                match panel.try_borrow_mut() {
                    Ok(mut panel) => panel.dispatch(action),
                    Err(_) => tracing::warn!("{} ignored: previous action still running", action),
                }
            }
        };

        let send = dispatch.clone();
        ui.on_send_serial(move |command| send(PanelAction::SendSerial(command.to_string())));

        let info = dispatch.clone();
        ui.on_get_arduino_info(move || info(PanelAction::SerialInfo));

        let daq_info = dispatch.clone();
        ui.on_get_daq_info(move || daq_info(PanelAction::DaqInfo));

        let ready = dispatch.clone();
        ui.on_ready_daq(move || ready(PanelAction::ReadyDaq));

        let reset = dispatch;
        ui.on_reset_daq(move || reset(PanelAction::ResetDaq));

        let ui_weak = ui.as_weak();
        let lifecycle = Arc::clone(lifecycle);
        ui.on_quit_requested(move || {
            if let Some(ui) = ui_weak.upgrade() {
                shut_down(&ui, &lifecycle, ShutdownTrigger::KeyboardShortcut);
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Route window close and SIGINT into the same teardown as Ctrl+Q.
    fn setup_shutdown(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        lifecycle: &Arc<Lifecycle>,
    ) {
        let ui_weak = ui.as_weak();
        let on_close = Arc::clone(lifecycle);
        ui.window().on_close_requested(move || {
            if let Some(ui) = ui_weak.upgrade() {
                shut_down(&ui, &on_close, ShutdownTrigger::WindowClose);
            }
            slint::CloseRequestResponse::HideWindow
        });

        let on_interrupt = Arc::clone(lifecycle);
        bridge.watch_interrupt(move |ui| {
            shut_down(ui, &on_interrupt, ShutdownTrigger::Interrupt);
        });
    }
}

/// Window-side effects of the shell teardown.
trait ShellWindow {
    fn hide_window(&self) -> Result<(), slint::PlatformError>;

    fn quit_event_loop(&self) -> Result<(), slint::EventLoopError>;
}

impl ShellWindow for MainWindow {
    fn hide_window(&self) -> Result<(), slint::PlatformError> {
        self.hide()
    }

    fn quit_event_loop(&self) -> Result<(), slint::EventLoopError> {
        slint::quit_event_loop()
    }
}

/// The single teardown path: cancel the poller, hide the window, quit the loop.
///
/// The poller observes the cancel token fired by `request_shutdown` and stops
/// its own timer on the next tick.
fn shut_down(window: &impl ShellWindow, lifecycle: &Lifecycle, trigger: ShutdownTrigger) {
    if !lifecycle.request_shutdown(trigger) {
        return;
    }

    if let Err(e) = window.hide_window() {
        tracing::warn!("Failed to hide main window: {}", e);
    }
    if let Err(e) = window.quit_event_loop() {
        tracing::warn!("Failed to quit event loop: {}", e);
    }
}
