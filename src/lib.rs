//! # Owner Logger System
//!
//! Structured loggers bound to the code that owns them, with levels that
//! can be changed at runtime.
//!
//! ## Features
//!
//! - **One logger per owner**: a [`Registry`] hands out the same [`Logger`]
//!   for an identity, initialized lazily from a [`ConfigSource`]
//! - **Glob level rules**: the longest matching pattern decides an owner's level
//! - **Temporary overrides**: raise verbosity for a while and roll back automatically
//! - **Broadcast control**: change every logger matching a glob at once
//! - **Forgiving context**: malformed key/value arguments become diagnostics, never panics
//! - **Sinks**: console and size-rotated, gzip-compressed files in text or JSON
//!
//! ```
//! use owner_logger_system::prelude::*;
//! use std::time::Duration;
//!
//! let registry = Registry::new(LoggerConfig::default());
//! let logger = registry.get_or_create("app::db::Pool");
//!
//! logger.infow("connected", &args!["host", "db-1", "port", 5432]);
//! registry
//!     .temporary_set_level("app::db::*", LogLevel::Debug, Duration::from_secs(60))
//!     .unwrap();
//! assert_eq!(logger.level().unwrap(), LogLevel::Debug);
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::args;
    pub use crate::appenders::{ConsoleAppender, RotatingFileAppender};
    pub use crate::core::{
        Appender, Arg, ConfigSource, ConsoleStream, Encoding, Field, FieldValue, FileConfig,
        JsonFileSource, LevelPatterns, LogEntry, LogLevel, Logger, LoggerConfig, LoggerError,
        NameMode, Registry, Result,
    };
}

pub use appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy};
pub use core::{
    resolve_level, sweeten, Appender, Arg, CallerInfo, ConfigSource, ConsoleConfig,
    ConsoleStream, Encoding, Field, FieldValue, FileConfig, JsonFileSource, LevelPatterns,
    LogEntry, LogLevel, Logger, LoggerConfig, LoggerError, NameMode, Registry, Result,
    SinkRouter,
};
