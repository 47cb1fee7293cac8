//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbosity of a record, and the threshold a logger emits at.
///
/// Lower ordinal means more verbose. A record at level `L` is emitted iff
/// `L >= current`. `Invalid` is a sentinel that sorts above every real level,
/// so a logger sitting at `Invalid` emits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    #[serde(alias = "warning")]
    Warn = 2,
    Error = 3,
    Critical = 4,
    Fatal = 5,
    Invalid = 255,
}

impl LogLevel {
    /// Every level a record can be written at, most verbose first
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Fatal => "FATAL",
            LogLevel::Invalid => "INVALID",
        }
    }

    /// Lowercase name used by the JSON encoder
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Fatal => "fatal",
            LogLevel::Invalid => "invalid",
        }
    }

    /// Decode the value stored in a logger's atomic level slot.
    ///
    /// Anything that is not a real level decodes to `Invalid`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            4 => LogLevel::Critical,
            5 => LogLevel::Fatal,
            _ => LogLevel::Invalid,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_valid(&self) -> bool {
        *self != LogLevel::Invalid
    }

    /// Critical and Fatal end the calling thread or process whether or not
    /// their record is written
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogLevel::Critical | LogLevel::Fatal)
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Critical => BrightRed,
            LogLevel::Fatal => BrightRed,
            LogLevel::Invalid => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
