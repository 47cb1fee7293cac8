//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink the [`SinkRouter`](super::sink_router::SinkRouter) writes records to.
///
/// Records arrive one at a time in submission order. Errors are retained by
/// the router and reported from `sync`.
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
