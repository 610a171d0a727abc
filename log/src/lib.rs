//! # Logging Library
//!
//! Process-wide logging for hudcam: one logger is installed at startup and the
//! `debug!`/`info!`/`warning!`/`error!`/`critical!` macros forward to it.
//! Before a logger is installed the macros do nothing, which keeps unit tests
//! of the main crate quiet.
use colored::Colorize;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};

/// Submodule containing the console + file logger
pub mod logger;

static LOGGER: OnceLock<Arc<dyn Logger + Send + Sync>> = OnceLock::new();

/// Sets the global logger instance for the application
///
/// # Returns
///
/// * `Ok(())` if the logger was successfully set
/// * `Err(LogError::AlreadyInitialized)` if a logger has already been initialized
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use log::logger::AdvancedLogger;
/// use log::{set_logger, LogLevel};
///
/// let logger = Arc::new(AdvancedLogger::new(LogLevel::Debug, None));
/// set_logger(logger).expect("Failed to initialize logger");
/// ```
pub fn set_logger(logger: Arc<dyn Logger + Send + Sync>) -> Result<(), LogError> {
    LOGGER
        .set(logger)
        .map_err(|_| LogError::AlreadyInitialized)
}

/// Retrieves the current global logger, if one is set
pub fn logger() -> Option<Arc<dyn Logger + Send + Sync>> {
    LOGGER.get().cloned()
}

/// Errors that can occur during logger operations
#[derive(Debug)]
pub enum LogError {
    /// Returned when attempting to initialize a logger after one has already been set
    AlreadyInitialized,
    /// Returned when no data directory is available for the log file
    NoLogDir,
}

impl Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::AlreadyInitialized => write!(f, "Logger has already been initialized"),
            LogError::NoLogDir => write!(f, "No data directory available for the log file"),
        }
    }
}

impl std::error::Error for LogError {}

/// Trait that all logger implementations must implement
pub trait Logger: Send + Sync {
    /// Logs a message at INFO level
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
    /// Logs a message at WARNING level
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }
    /// Logs a message at ERROR level
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
    /// Logs a message at CRITICAL level
    fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
    /// Logs a message at DEBUG level
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
    /// Logs a message with a specified log level
    fn log(&self, level: LogLevel, message: &str);
    /// Sets the minimum logging level that will be output
    fn set_level(&self, level: LogLevel);
}

/// Logging levels in order of increasing severity.
///
/// `NoLog` sorts above every real level, so a logger set to it drops everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Debug information for development purposes
    Debug = 0,
    #[default]
    /// Standard informational messages
    Info = 1,
    /// Warning messages indicating potential issues
    Warning = 2,
    /// Error messages for recoverable failures
    Error = 3,
    /// Critical messages for severe errors that might cause program termination
    Critical = 4,
    /// Special level that suppresses all logging
    NoLog = 5,
}

impl LogLevel {
    /// Returns the uncolored name of the level, used in the log file
    pub fn raw_str(&self) -> &'static str {
        match self {
            LogLevel::NoLog => "NOLOG",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            3 => LogLevel::Error,
            4 => LogLevel::Critical,
            _ => LogLevel::NoLog,
        }
    }

    /// Whether a message at `level` passes a logger whose threshold is `self`
    pub fn allows(&self, level: LogLevel) -> bool {
        level != LogLevel::NoLog && level >= *self
    }
}

impl Display for LogLevel {
    /// Provides colored text formatting for each log level
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LogLevel::*;
        let level_str = match self {
            NoLog => String::new(),
            Info => format!("{}", "INFO".blue().bold()),
            Warning => format!("{}", "WARNING".yellow().bold()),
            Error => format!("{}", "ERROR".red().bold()),
            Critical => format!("{}", "CRITICAL".bright_red().bold()),
            Debug => format!("{}", "DEBUG".cyan().bold()),
        };
        write!(f, "{level_str}")
    }
}

/// Logs a message with the specified log level
///
/// # Example
///
/// ```
/// use log::{log, LogLevel};
///
/// log!(LogLevel::Warning, "This is a {} message", "warning");
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {{
        if let Some(logger) = $crate::logger() {
            let message = format!($($arg)*);
            logger.log($level, &message);
        }
    }};
}

/// Logs a message at INFO level
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Info, $($arg)*);
    }};
}

/// Logs a message at WARNING level
///
/// # Example
///
/// ```
/// use log::warning;
///
/// let skipped = 3;
/// warning!("Skipped {} frames", skipped);
/// ```
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Warning, $($arg)*);
    }};
}

/// Logs a message at ERROR level
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Error, $($arg)*);
    }};
}

/// Logs a message at CRITICAL level
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Critical, $($arg)*);
    }};
}

/// Logs a message at DEBUG level
///
/// # Example
///
/// ```
/// use log::debug;
///
/// debug!("Frame size {:?}", (800, 600));
/// ```
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Debug, $($arg)*);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::AdvancedLogger;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Error < LogLevel::Critical);
        assert!(LogLevel::Critical < LogLevel::NoLog);
    }

    #[test]
    fn test_threshold_filtering() {
        assert!(LogLevel::Warning.allows(LogLevel::Error));
        assert!(LogLevel::Warning.allows(LogLevel::Warning));
        assert!(!LogLevel::Warning.allows(LogLevel::Info));
        assert!(LogLevel::Debug.allows(LogLevel::Debug));
        assert!(!LogLevel::NoLog.allows(LogLevel::Critical));
    }

    #[test]
    fn test_level_roundtrips_through_u8() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
            LogLevel::NoLog,
        ] {
            assert_eq!(LogLevel::from_u8(level as u8), level);
        }
    }

    #[test]
    fn test_logger_init_once() {
        let logger1 = Arc::new(AdvancedLogger::new(LogLevel::Debug, None));
        let first = set_logger(logger1);

        let logger2 = Arc::new(AdvancedLogger::new(LogLevel::Info, None));
        let second = set_logger(logger2);

        // Another test may have installed the logger first; either way the
        // second call in this test must be rejected.
        assert!(first.is_ok() || matches!(first, Err(LogError::AlreadyInitialized)));
        assert!(matches!(second, Err(LogError::AlreadyInitialized)));

        debug!("This is a debug message");
        info!("This is an info message");
        warning!("This is a warning message");
    }
}
