// Record mailbox - unbounded MPSC hand-off between log producers and the GUI thread
//
// Any thread may hold a `Mailbox` and `put` records into it. Exactly one
// `MailboxReader` exists and it lives with the console poller on the GUI thread.

use crate::logging::record::LogRecord;
use tokio::sync::mpsc;

/// Create a connected producer/consumer pair.
pub fn channel() -> (Mailbox, MailboxReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Mailbox { tx }, MailboxReader { rx })
}

/// Producer side of the record mailbox.
///
/// Cheap to clone; every clone feeds the same FIFO.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl Mailbox {
    /// Enqueue a record without blocking.
    ///
    /// Once the reader is gone there is nowhere to display the record, so it
    /// is dropped.
    pub fn put(&self, record: LogRecord) {
        let _ = self.tx.send(record);
    }

    /// Whether the consumer side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the record mailbox.
#[derive(Debug)]
pub struct MailboxReader {
    rx: mpsc::UnboundedReceiver<LogRecord>,
}

impl MailboxReader {
    /// Take the oldest record, or `None` when nothing is queued.
    pub fn try_get(&mut self) -> Option<LogRecord> {
        // Disconnected only happens once every producer is gone, which for
        // the reader is the same as empty.
        self.rx.try_recv().ok()
    }

    /// Take everything currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<LogRecord> {
        std::iter::from_fn(|| self.try_get()).collect()
    }
}
