// Console poller - drains the record mailbox on the GUI thread
//
// The poller is the only reader of the mailbox and the only writer of the
// console surface. It runs from a repeating Slint timer, so every tick
// executes on the event loop thread.

use crate::logging::{LineFormatter, LogRecord, MailboxReader, Severity};
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Color family of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTone {
    Muted,
    Default,
    Warn,
    Error,
}

/// How a console line is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    /// Severity name the line is tagged with
    pub tag: &'static str,
    pub tone: LineTone,
    pub emphasized: bool,
}

/// Fixed severity → style table.
pub fn style_for(severity: Severity) -> LineStyle {
    let (tone, emphasized) = match severity {
        Severity::Debug => (LineTone::Muted, false),
        Severity::Info => (LineTone::Default, false),
        Severity::Warning => (LineTone::Warn, false),
        Severity::Error => (LineTone::Error, false),
        Severity::Critical => (LineTone::Error, true),
    };
    LineStyle {
        tag: severity.name(),
        tone,
        emphasized,
    }
}

/// A formatted record ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub text: String,
    pub style: LineStyle,
}

/// Display target for console lines; lives on the GUI thread.
pub trait LogSurface {
    fn append_line(&mut self, line: RenderedLine);

    fn scroll_to_end(&mut self);
}

/// Drains the mailbox into a [`LogSurface`].
pub struct LogPoller<S: LogSurface> {
    reader: MailboxReader,
    formatter: Arc<LineFormatter>,
    surface: S,
    cancel: watch::Receiver<bool>,
}

impl<S: LogSurface> LogPoller<S> {
    pub fn new(
        reader: MailboxReader,
        formatter: Arc<LineFormatter>,
        surface: S,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            reader,
            formatter,
            surface,
            cancel,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Format one record the way the console shows it.
    pub fn render(&self, record: &LogRecord) -> RenderedLine {
        RenderedLine {
            text: self.formatter.format(record),
            style: style_for(record.severity),
        }
    }

    /// Display everything queued right now; never waits for more.
    ///
    /// # Returns
    /// The number of records displayed
    pub fn drain(&mut self) -> usize {
        let mut shown = 0;
        while let Some(record) = self.reader.try_get() {
            let line = self.render(&record);
            self.surface.append_line(line);
            shown += 1;
        }
        if shown > 0 {
            self.surface.scroll_to_end();
        }
        shown
    }

    /// One scheduled run: stop once the shell is tearing down, otherwise drain.
    pub fn tick(&mut self) -> ControlFlow<()> {
        if *self.cancel.borrow() {
            return ControlFlow::Break(());
        }
        self.drain();
        ControlFlow::Continue(())
    }
}

/// Timer that a repeating task stops from inside its own tick.
pub trait StopHandle {
    fn stop_timer(&self);
}

impl StopHandle for slint::Timer {
    fn stop_timer(&self) {
        self.stop();
    }
}

/// Run one tick; on `Break`, stop the timer if it still exists.
fn run_tick<F, H>(tick: &mut F, timer: &Weak<H>) -> ControlFlow<()>
where
    F: FnMut() -> ControlFlow<()>,
    H: StopHandle,
{
    let flow = tick();
    if flow.is_break() {
        if let Some(timer) = timer.upgrade() {
            timer.stop_timer();
        }
    }
    flow
}

/// Repeating GUI-thread task backed by a Slint timer.
///
/// The tick closure runs every `period` until it returns `Break` or the task
/// is cancelled; dropping the task stops the timer as well.
pub struct RepeatingTask {
    timer: Rc<slint::Timer>,
}

impl RepeatingTask {
    pub fn start<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + 'static,
    {
        let timer = Rc::new(slint::Timer::default());
        let weak = Rc::downgrade(&timer);

        timer.start(slint::TimerMode::Repeated, period, move || {
            let _ = run_tick(&mut tick, &weak);
        });

        Self { timer }
    }

    pub fn cancel(&self) {
        self.timer.stop_timer();
    }
}
