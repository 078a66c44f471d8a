// Logging infrastructure
//
// Every log call in the application goes through `tracing`. The subscriber
// installed here fans each event out to:
// - a daily rotating log file
// - the terminal (optional, ANSI colored)
// - the record mailbox feeding the GUI console (see `QueueLayer`)

pub mod layer;
pub mod mailbox;
pub mod record;

pub use layer::{CRITICAL_FIELD, QueueLayer};
pub use mailbox::{Mailbox, MailboxReader};
pub use record::{DEFAULT_LINE_FORMAT, LineFormatter, LogRecord, Severity};

use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use std::sync::Arc;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log an ERROR event that the console renders as CRITICAL.
///
/// ```ignore
/// rigpanel::critical!("DAQ stopped responding mid-scan");
/// ```
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        ::tracing::error!(critical = true, $($arg)+)
    };
}

/// Consumer half of the log bridge, handed to the GUI console.
pub struct ConsoleFeed {
    pub reader: MailboxReader,
    pub formatter: Arc<LineFormatter>,
}

/// Build the producer layer and the matching console feed.
///
/// The layer goes into the global subscriber; the feed is kept until the
/// console surface exists. Anything logged in between waits in the mailbox.
pub fn bridge(formatter: LineFormatter) -> (QueueLayer, ConsoleFeed) {
    let (mailbox, reader) = mailbox::channel();
    let layer = QueueLayer::new(mailbox, formatter);
    let feed = ConsoleFeed {
        reader,
        formatter: layer.formatter(),
    };
    (layer, feed)
}

/// Default filter: this crate at DEBUG (or INFO), everything else at INFO.
///
/// `RUST_LOG` takes precedence when set.
pub fn default_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new(format!("info,{}=debug", env!("CARGO_CRATE_NAME")))
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Install the process-wide subscriber.
///
/// Logs are written to `settings.log_dir` with daily rotation, optionally
/// echoed to the terminal, and always forwarded to `queue_layer`.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep file
/// logging active
pub fn setup_logging(
    settings: &LoggingSettings,
    queue_layer: QueueLayer,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Create log directory if it doesn't exist
    let log_path = Utf8PathBuf::from(&settings.log_dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_path))?;
    }

    let file_appender = rolling::daily(&log_path, &settings.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = settings.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(default_filter(settings.debug))
        .with(file_layer)
        .with(console_layer)
        .with(queue_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        settings.log_dir,
        settings.log_prefix,
        settings.debug,
        settings.console_output
    );

    Ok(guard)
}
