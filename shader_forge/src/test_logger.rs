/// Capturing logger for unit tests
///
/// Installs itself as the global logger and records the entries logged from the
/// installing thread only, so tests running in parallel do not leak into each
/// other. Tests using it must still be `#[serial]` since the logger slot is
/// process-wide.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use crate::forge::Forge;
use crate::log::{Logger, LogEntry, LogSeverity};

#[derive(Clone)]
pub struct CapturingLogger {
    thread: ThreadId,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturingLogger {
    /// Install a fresh capturing logger and return a handle to its entries
    pub fn install() -> Self {
        let logger = Self {
            thread: thread::current().id(),
            entries: Arc::new(Mutex::new(Vec::new())),
        };
        Forge::set_logger(logger.clone());
        logger
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, severity: LogSeverity) -> usize {
        self.entries().iter().filter(|e| e.severity == severity).count()
    }
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        if thread::current().id() == self.thread {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}
