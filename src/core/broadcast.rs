//! Level changes fanned out to every logger whose identity matches a glob

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
    registry::Registry,
};
use glob::Pattern;
use std::time::Duration;

impl Registry {
    /// Permanently set the level of every registered logger matching
    /// `pattern`.
    ///
    /// Returns how many loggers were changed.
    pub fn set_level(&self, pattern: &str, level: LogLevel) -> Result<usize> {
        self.temporary_set_level(pattern, level, Duration::ZERO)
    }

    /// Apply a temporary override to every registered logger matching
    /// `pattern`.
    ///
    /// The glob must match the whole identity. The registry lock is only
    /// held while the identities are collected; each logger is then changed
    /// under its own override lock, so the fan-out is not atomic across
    /// loggers. Loggers that fail to initialize are skipped.
    pub fn temporary_set_level(
        &self,
        pattern: &str,
        level: LogLevel,
        duration: Duration,
    ) -> Result<usize> {
        if !level.is_valid() {
            return Err(LoggerError::InvalidLevel(format!(
                "cannot broadcast {} to '{}'",
                level, pattern
            )));
        }
        let matcher =
            Pattern::new(pattern).map_err(|e| LoggerError::pattern(pattern, e.msg))?;

        let mut changed = 0;
        for (identity, logger) in self.snapshot() {
            if !matcher.matches(&identity) {
                continue;
            }
            match logger.temporary_set_level(level, duration) {
                Ok(()) => changed += 1,
                Err(LoggerError::Initialization { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(changed)
    }
}
