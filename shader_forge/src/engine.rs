/// Forge - process-wide logging entry point
///
/// The logger is the only global state in Shader Forge. Devices, pipeline caches
/// and programs are always passed explicitly by the caller.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

/// Logging front-end used by the `forge_*!` macros
pub struct Forge;

impl Forge {
    /// Set a custom logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shader_forge::forge::{Forge, log::{Logger, LogEntry, LogSeverity}};
    ///
    /// // Only surface failures, e.g. while hot-reloading shaders
    /// struct ReloadLogger;
    /// impl Logger for ReloadLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         if entry.severity >= LogSeverity::Warn {
    ///             eprintln!("[reload] {}: {}", entry.source, entry.message);
    ///         }
    ///     }
    /// }
    ///
    /// Forge::set_logger(ReloadLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to `DefaultLogger::default()`
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Log without file:line (used by forge_trace! .. forge_warn!)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log with file:line (used by forge_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        if let Ok(lock) = logger().read() {
            lock.log(&entry);
        }
    }
}
