//! Log entry structure

use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Source location of the logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: &'static str,
    pub line: u32,
}

impl CallerInfo {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One structured record handed to the sinks
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub logger_name: Option<String>,
    pub message: String,
    pub caller: Option<CallerInfo>,
    pub fields: Vec<Field>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a message cannot forge extra records in line-oriented sinks.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            time: Utc::now(),
            level,
            logger_name: None,
            message: Self::sanitize_message(message.as_ref()),
            caller: None,
            fields: Vec::new(),
        }
    }

    pub fn with_logger_name(mut self, name: Option<String>) -> Self {
        self.logger_name = name;
        self
    }

    pub fn with_caller(mut self, caller: Option<CallerInfo>) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Value of the first field named `key`
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}
