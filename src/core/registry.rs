//! Owner identity → logger map with get-or-create semantics

use super::{
    config::ConfigSource,
    error::Result,
    level_resolver::{resolve_level, LevelPatterns},
    logger::Logger,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct RegistryInner {
    loggers: RwLock<HashMap<String, Logger>>,
    source: Arc<dyn ConfigSource>,
    /// Level rules installed by `apply_level_patterns`, preferred over each
    /// logger's own configuration
    levels: RwLock<Option<Arc<LevelPatterns>>>,
}

impl RegistryInner {
    pub(crate) fn level_patterns(&self) -> Option<Arc<LevelPatterns>> {
        self.levels.read().clone()
    }

    /// Flush every initialized logger, returning the first error
    pub(crate) fn sync_all(&self) -> Result<()> {
        let mut first_error = None;
        for logger in self.snapshot() {
            if let Some(Err(e)) = logger.sync_if_initialized() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Logger> {
        self.loggers.read().values().cloned().collect()
    }
}

/// Process-local set of loggers, one per owner identity.
///
/// Handles are cheap to clone and share the same map. Entries are never
/// removed. Several independent registries can coexist, e.g. one per test.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Loggers created through this registry load their configuration from
    /// `source` at first use
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                loggers: RwLock::new(HashMap::new()),
                source,
                levels: RwLock::new(None),
            }),
        }
    }

    /// The logger for `identity`, created on first request.
    ///
    /// Racing first callers all receive the same instance. Creation does not
    /// initialize the logger; that happens on its first use.
    pub fn get_or_create(&self, identity: &str) -> Logger {
        self.get_or_create_with_source(identity, Arc::clone(&self.inner.source))
    }

    /// Like [`Registry::get_or_create`] with a configuration source of its
    /// own.
    ///
    /// `source` only matters if this call creates the logger.
    pub fn get_or_create_with_source(
        &self,
        identity: &str,
        source: Arc<dyn ConfigSource>,
    ) -> Logger {
        if let Some(logger) = self.inner.loggers.read().get(identity) {
            return logger.clone();
        }

        let mut loggers = self.inner.loggers.write();
        loggers
            .entry(identity.to_string())
            .or_insert_with(|| {
                Logger::registered(identity.to_string(), source, Arc::downgrade(&self.inner))
            })
            .clone()
    }

    /// The logger owned by type `T`, keyed by its full type path
    pub fn logger_for<T: ?Sized>(&self) -> Logger {
        self.get_or_create(std::any::type_name::<T>())
    }

    pub fn get(&self, identity: &str) -> Option<Logger> {
        self.inner.loggers.read().get(identity).cloned()
    }

    /// Identities registered so far, sorted
    pub fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.inner.loggers.read().keys().cloned().collect();
        identities.sort();
        identities
    }

    pub fn len(&self) -> usize {
        self.inner.loggers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush every initialized logger and return the first error.
    ///
    /// Loggers that were never used are not initialized by this call.
    pub fn sync(&self) -> Result<()> {
        self.inner.sync_all()
    }

    /// Replace the level rules of every logger in this registry.
    ///
    /// Each logger's level is resolved again from `patterns` and set
    /// permanently. Loggers created later resolve against `patterns` too.
    /// Returns how many loggers were changed; loggers whose initialization
    /// failed are skipped.
    pub fn apply_level_patterns(&self, patterns: LevelPatterns) -> usize {
        let patterns = Arc::new(patterns);
        *self.inner.levels.write() = Some(Arc::clone(&patterns));

        self.inner
            .snapshot()
            .into_iter()
            .filter(|logger| {
                logger
                    .set_level(resolve_level(logger.identity(), &patterns))
                    .is_ok()
            })
            .count()
    }

    pub(crate) fn snapshot(&self) -> Vec<(String, Logger)> {
        self.inner
            .loggers
            .read()
            .iter()
            .map(|(identity, logger)| (identity.clone(), logger.clone()))
            .collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("loggers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LoggerConfig, LoggerError};

    struct Pool;

    #[test]
    fn test_same_identity_same_instance() {
        let registry = Registry::new(LoggerConfig::default());
        let a = registry.get_or_create("app::Pool");
        let b = registry.get_or_create("app::Pool");
        let c = registry.get_or_create("app::Cache");

        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_creation_does_not_initialize() {
        let registry = Registry::new(|| -> Result<LoggerConfig> {
            Err(LoggerError::config("source", "not ready"))
        });
        let logger = registry.get_or_create("app::Early");
        assert!(!logger.is_initialized());
        assert!(registry.sync().is_ok());
    }

    #[test]
    fn test_logger_for_type() {
        let registry = Registry::new(LoggerConfig::default());
        let logger = registry.logger_for::<Pool>();
        assert!(logger.identity().ends_with("registry::tests::Pool"));
        assert!(logger.same_instance(&registry.logger_for::<Pool>()));
    }

    #[test]
    fn test_source_only_used_on_creation() {
        let registry = Registry::new(LoggerConfig::default());
        let verbose = LoggerConfig::default()
            .with_levels(LevelPatterns::new(LogLevel::Debug).unwrap());

        let first = registry.get_or_create_with_source("app::Own", Arc::new(verbose));
        let quiet = LoggerConfig::default()
            .with_levels(LevelPatterns::new(LogLevel::Error).unwrap());
        let second = registry.get_or_create_with_source("app::Own", Arc::new(quiet));

        assert!(first.same_instance(&second));
        assert_eq!(second.level().unwrap(), LogLevel::Debug);
        assert_eq!(registry.get_or_create("other").level().unwrap(), LogLevel::Info);
    }

    #[test]
    fn test_identities_sorted() {
        let registry = Registry::new(LoggerConfig::default());
        registry.get_or_create("b");
        registry.get_or_create("a");
        assert_eq!(registry.identities(), vec!["a", "b"]);
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_apply_level_patterns() {
        let registry = Registry::new(LoggerConfig::default());
        let db = registry.get_or_create("app::db::Pool");
        let http = registry.get_or_create("app::http::Server");
        assert_eq!(db.level().unwrap(), LogLevel::Info);

        let patterns = LevelPatterns::from_rules([
            ("*", LogLevel::Warn),
            ("app::db::*", LogLevel::Debug),
        ])
        .unwrap();
        assert_eq!(registry.apply_level_patterns(patterns), 2);

        assert_eq!(db.level().unwrap(), LogLevel::Debug);
        assert_eq!(http.level().unwrap(), LogLevel::Warn);
        assert_eq!(
            registry.get_or_create("app::db::Conn").level().unwrap(),
            LogLevel::Debug
        );
    }
}
