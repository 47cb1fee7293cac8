//! Logging macros for `format!`-style messages.
//!
//! The level is checked before the message is formatted, so arguments of a
//! disabled call are never rendered. Critical and Fatal are always formatted
//! since they panic or exit even when their record is filtered out.
//!
//! # Examples
//!
//! ```
//! use owner_logger_system::prelude::*;
//! use owner_logger_system::info;
//!
//! let registry = Registry::new(LoggerConfig::default());
//! let logger = registry.get_or_create("app::Server");
//!
//! info!(logger, "Server started");
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Build a `[Arg; N]` for the logging verbs from mixed values.
///
/// ```
/// use owner_logger_system::prelude::*;
///
/// let logger = Registry::new(LoggerConfig::default()).get_or_create("app");
/// logger.infow("user login", &args!["user", "ada", "attempt", 2, "ok", true]);
/// ```
#[macro_export]
macro_rules! args {
    () => {{
        let empty: [$crate::core::Arg; 0] = [];
        empty
    }};
    ($($arg:expr),+ $(,)?) => {
        [$($crate::core::Arg::from($arg)),+]
    };
}

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use owner_logger_system::prelude::*;
/// # let logger = Registry::new(LoggerConfig::default()).get_or_create("app");
/// use owner_logger_system::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if level.is_terminal() || logger.enabled(level) {
            logger.log_message(level, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
///
/// ```
/// # use owner_logger_system::prelude::*;
/// # let logger = Registry::new(LoggerConfig::default()).get_or_create("app");
/// use owner_logger_system::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message, flush the logger's sinks and panic.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

/// Log a fatal-level message, flush every logger of its registry and exit
/// the process with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
