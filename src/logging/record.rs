use chrono::{DateTime, Local};
use std::fmt;
use tracing::Level;

/// Ordered log importance, lowest first.
///
/// `tracing` has no CRITICAL level; an ERROR event carrying `critical = true`
/// is promoted to [`Severity::Critical`] (see [`crate::critical!`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Map a `tracing` level onto the display severity.
    pub fn from_level(level: Level, critical: bool) -> Self {
        match level {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warning,
            Level::ERROR if critical => Severity::Critical,
            Level::ERROR => Severity::Error,
        }
    }

    /// Upper-case level name, also used as the display tag.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One emitted log event, captured at emission time and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub timestamp: DateTime<Local>,
    pub target: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(severity: Severity, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            timestamp: Local::now(),
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Default display template: timestamp followed by the message.
pub const DEFAULT_LINE_FORMAT: &str = "{asctime}: {message}";

const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Turns a [`LogRecord`] into one display line.
///
/// Supported placeholders are `{asctime}`, `{levelname}`, `{target}` and
/// `{message}`. Anything else, including unknown placeholders, is copied
/// through unchanged, so formatting never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormatter {
    template: String,
}

impl LineFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message.len() + 24);
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };

            let placeholder = &tail[1..end];
            match placeholder {
                "asctime" => out.push_str(&record.timestamp.format(ASCTIME_FORMAT).to_string()),
                "levelname" => out.push_str(record.severity.name()),
                "target" => out.push_str(&record.target),
                "message" => out.push_str(&record.message),
                _ => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_FORMAT)
    }
}
