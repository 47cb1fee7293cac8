//! Fan-out of records to the appenders and hooks of one logger

use super::{
    appender::Appender,
    config::{ConsoleStream, LoggerConfig},
    error::{LoggerError, Result},
    log_entry::LogEntry,
};
use crate::appenders::{ConsoleAppender, RotatingFileAppender};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Observer called with every record a logger emits
pub type Hook = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Owns the sinks of one logger.
///
/// Writes happen synchronously in submission order. A failing or panicking
/// appender never stops the others; the first failure is kept and handed
/// back by [`SinkRouter::flush`]. Hooks are not run by the router: callers
/// take [`SinkRouter::hooks`] and pass them to [`run_hooks`] once they have
/// released any lock around the router.
#[derive(Default)]
pub struct SinkRouter {
    appenders: Vec<Box<dyn Appender>>,
    hooks: Arc<Vec<Hook>>,
    first_error: Option<LoggerError>,
}

impl SinkRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the console and file sinks a configuration asks for
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let mut router = Self::new();

        if config.console.stream != ConsoleStream::No {
            router.add_appender(Box::new(
                ConsoleAppender::new(config.console.stream).with_encoding(config.console.encoding),
            ));
        }
        if config.file.path.is_some() {
            router.add_appender(Box::new(RotatingFileAppender::from_config(&config.file)?));
        }

        Ok(router)
    }

    pub fn add_appender(&mut self, appender: Box<dyn Appender>) {
        self.appenders.push(appender);
    }

    pub fn add_hook(&mut self, hook: Hook) {
        Arc::make_mut(&mut self.hooks).push(hook);
    }

    pub fn appender_count(&self) -> usize {
        self.appenders.len()
    }

    /// Snapshot of the registered hooks
    pub fn hooks(&self) -> Arc<Vec<Hook>> {
        Arc::clone(&self.hooks)
    }

    /// Hand one record to every appender
    pub fn write(&mut self, entry: &LogEntry) {
        for (idx, appender) in self.appenders.iter_mut().enumerate() {
            let append_result = catch_unwind(AssertUnwindSafe(|| appender.append(entry)));

            let failure = match append_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Appender #{} ({}) failed: {}", idx, appender.name(), e);
                    e
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(panic_info.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} panicked: {}. \
                         Other appenders continue to function.",
                        idx, panic_msg
                    );
                    LoggerError::writer(format!("appender #{} panicked: {}", idx, panic_msg))
                }
            };
            self.first_error.get_or_insert(failure);
        }
    }

    /// Flush every appender.
    ///
    /// Returns the first error seen since the previous flush, whether it came
    /// from a write or from this flush, and clears it.
    pub fn flush(&mut self) -> Result<()> {
        for (idx, appender) in self.appenders.iter_mut().enumerate() {
            let flush_result = catch_unwind(AssertUnwindSafe(|| appender.flush()));

            let failure = match flush_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    let panic_msg = panic_message(panic_info.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} panicked during flush: {}. \
                         Other appenders continue to function.",
                        idx, panic_msg
                    );
                    LoggerError::writer(format!("appender #{} panicked: {}", idx, panic_msg))
                }
            };
            self.first_error.get_or_insert(failure);
        }

        match self.first_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Call every hook with `entry`; a panicking hook does not stop the rest
pub fn run_hooks(hooks: &[Hook], entry: &LogEntry) {
    for hook in hooks {
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| hook(entry))) {
            eprintln!(
                "[LOGGER CRITICAL] Hook panicked: {}",
                panic_message(panic_info.as_ref())
            );
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
