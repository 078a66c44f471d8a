use crate::logging::mailbox::Mailbox;
use crate::logging::record::{LineFormatter, LogRecord, Severity};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Field name that promotes an ERROR event to CRITICAL.
pub const CRITICAL_FIELD: &str = "critical";

/// `tracing` layer that forwards every event into the record mailbox.
///
/// The layer only captures the event into a [`LogRecord`]; no display line is
/// produced here. The formatter it carries is handed to the console poller,
/// which formats at drain time on the GUI thread.
pub struct QueueLayer {
    mailbox: Mailbox,
    formatter: Arc<LineFormatter>,
}

impl QueueLayer {
    pub fn new(mailbox: Mailbox, formatter: LineFormatter) -> Self {
        Self {
            mailbox,
            formatter: Arc::new(formatter),
        }
    }

    /// The formatter records should be rendered with.
    pub fn formatter(&self) -> Arc<LineFormatter> {
        Arc::clone(&self.formatter)
    }
}

impl<S: Subscriber> Layer<S> for QueueLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let severity = Severity::from_level(*metadata.level(), visitor.critical);
        self.mailbox
            .put(LogRecord::new(severity, metadata.target(), visitor.finish()));
    }
}

/// Collects the `message` field plus any extra fields as `key=value`.
#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: String,
    critical: bool,
}

impl RecordVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for RecordVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.critical = value;
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}
