//! Core logger types and traits

pub mod appender;
pub mod broadcast;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod level_resolver;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod registry;
pub mod rollback_timer;
pub mod sink_router;
pub mod sweeten;

pub use appender::Appender;
pub use config::{
    ConfigSource, ConsoleConfig, ConsoleStream, Encoding, FileConfig, JsonFileSource,
    LoggerConfig, NameMode,
};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue};
pub use level_resolver::{resolve_level, LevelPatterns, DEFAULT_PATTERN};
pub use log_entry::{CallerInfo, LogEntry};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use registry::Registry;
pub use rollback_timer::RollbackTimer;
pub use sink_router::{run_hooks, Hook, SinkRouter};
pub use sweeten::{render_message, render_template, sweeten, Arg, Diagnostic, Sweetened};
