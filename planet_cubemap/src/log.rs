//! Diagnostics for the planet cubemap cache
//!
//! Cache and pool operations report through a single process-wide logger:
//! - Pluggable sink via the Logger trait (host console, file, test capture)
//! - Ordered severities with a minimum threshold (default: Debug)
//! - Colored console output by default, warnings and errors on stderr
//! - Source location attached to ERROR entries

use colored::*;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for log entries
///
/// Implement this trait to route cache diagnostics elsewhere, e.g. into
/// the host engine's console.
///
/// # Example
///
/// ```no_run
/// use planet_cubemap::planet::log::{Logger, LogEntry};
///
/// struct HostConsole;
///
/// impl Logger for HostConsole {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Reporting component, e.g. "planet::TextureCache"
    pub source: String,
    pub message: String,
    /// Source file (ERROR entries only)
    pub file: Option<&'static str>,
    /// Source line (ERROR entries only)
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` when the entry carries a source location
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Log severity levels, from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogSeverity {
    /// Per-lookup detail
    Trace,
    /// Render target creation and release
    Debug,
    /// Cache clears, pool setup and teardown
    Info,
    /// Degraded results (placeholder fallback, ignored arguments)
    Warn,
    /// Failed operations, with file:line
    Error,
}

impl LogSeverity {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    fn label(&self) -> ColoredString {
        match self {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        }
    }
}

/// Console logger
///
/// Line format: `[YYYY-MM-DD HH:MM:SS.mmm] [SEVERITY] [source] message (file:line)`.
/// Warn and Error go to stderr, the rest to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry as one console line
    pub fn format_entry(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.severity.label(),
            entry.source.bright_blue(),
            entry.message,
        );
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = Self::format_entry(entry);
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== PROCESS-WIDE LOGGER =====

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(LogSeverity::Debug as u8);

fn sink() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Install a custom logger
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut slot) = sink().write() {
        *slot = Box::new(logger);
    }
}

/// Go back to the `DefaultLogger` and the default threshold
pub fn reset_logger() {
    if let Ok(mut slot) = sink().write() {
        *slot = Box::new(DefaultLogger);
    }
    set_min_severity(LogSeverity::Debug);
}

/// Drop entries less severe than `severity`
pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

pub fn min_severity() -> LogSeverity {
    LogSeverity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

fn dispatch(severity: LogSeverity, source: &str, message: String, file: Option<&'static str>, line: Option<u32>) {
    if severity < min_severity() {
        return;
    }
    if let Ok(slot) = sink().read() {
        slot.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file,
            line,
        });
    }
}

/// Entry point of the logging macros
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(severity, source, message, None, None);
}

/// Entry point of `engine_error!`, with the caller's location
pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
    dispatch(severity, source, message, Some(file), Some(line));
}

// ===== LOGGING MACROS =====

/// Log at TRACE
///
/// # Example
///
/// ```ignore
/// engine_trace!("planet::TextureCache", "Looking up '{}'", key);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Trace, $source, format!($($arg)*))
    };
}

/// Log at DEBUG
///
/// # Example
///
/// ```ignore
/// engine_debug!("planet::TextureCache", "Created render target '{}'", key);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Debug, $source, format!($($arg)*))
    };
}

/// Log at INFO
///
/// # Example
///
/// ```ignore
/// engine_info!("planet::RenderTargetPool", "Allocated {} render targets", count);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Info, $source, format!($($arg)*))
    };
}

/// Log at WARN
///
/// # Example
///
/// ```ignore
/// engine_warn!("planet::ColorTexture", "Falling back to placeholder: {}", err);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Warn, $source, format!($($arg)*))
    };
}

/// Log at ERROR with the caller's file and line
///
/// # Example
///
/// ```ignore
/// engine_error!("planet::TextureCache", "Failed to create target: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
