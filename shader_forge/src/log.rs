//! Logging system for Shader Forge
//!
//! - Pluggable logger via the `Logger` trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default, with a minimum severity filter
//! - file:line details on ERROR logs
//!
//! Errors raised by the loader, the synthesizer and the pipeline factory are
//! logged where they are created, through `forge_fail!`, `forge_bail!` and `forge_err!`.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use std::sync::Mutex;
/// use shader_forge::forge::log::{Logger, LogEntry};
///
/// // Keeps the messages of one source, e.g. "forge::vulkan::shader"
/// struct SourceLogger {
///     source: &'static str,
///     lines: Mutex<Vec<String>>,
/// }
///
/// impl Logger for SourceLogger {
///     fn log(&self, entry: &LogEntry) {
///         if entry.source == self.source {
///             if let Ok(mut lines) = self.lines.lock() {
///                 lines.push(entry.message.clone());
///             }
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source area (e.g., "forge::program", "forge::vulkan::shader")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose information (per-binding synthesis details)
    Trace,

    /// Development information
    Debug,

    /// Important events (program created, pipeline created)
    Info,

    /// Potential issues
    Warn,

    /// Failures, logged with file:line
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the default logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Default logger: colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Warn and Error are written to stderr, everything else to stdout.
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Logger that drops entries below `min_severity`
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Minimum severity printed by this logger
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Whether an entry of this severity would be printed
    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Render an entry as one console line
    pub fn format_entry(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, source, entry.message, file, line
            ),
            _ => format!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::with_min_severity(LogSeverity::Info)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }
        let line = Self::format_entry(entry);
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// shader_forge::forge_trace!("forge::program", "binding {} merged", 3);
/// ```
#[macro_export]
macro_rules! forge_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::forge::Forge::log(
            $crate::forge::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! forge_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::forge::Forge::log(
            $crate::forge::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! forge_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::forge::Forge::log(
            $crate::forge::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! forge_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::forge::Forge::log(
            $crate::forge::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! forge_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::forge::Forge::log_detailed(
            $crate::forge::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an error value and evaluate to it
///
/// ```no_run
/// use shader_forge::forge::Error;
/// let err = shader_forge::forge_fail!("forge::program", Error::OutOfMemory);
/// ```
#[macro_export]
macro_rules! forge_fail {
    ($source:expr, $err:expr) => {{
        let err = $err;
        $crate::forge_error!($source, "{}", err);
        err
    }};
}

/// Log an error value and return it from the enclosing function
#[macro_export]
macro_rules! forge_bail {
    ($source:expr, $err:expr) => {
        return ::std::result::Result::Err($crate::forge_fail!($source, $err))
    };
}

/// Log a formatted message and evaluate to `Error::BackendError`
#[macro_export]
macro_rules! forge_err {
    ($source:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::forge_error!($source, "{}", msg);
        $crate::forge::Error::BackendError(msg)
    }};
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
