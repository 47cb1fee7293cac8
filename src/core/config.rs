//! Logger configuration and the sources it is loaded from

use super::error::{LoggerError, Result};
use super::level_resolver::LevelPatterns;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where console output goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    #[serde(alias = "none")]
    No,
    Stdout,
    Stderr,
}

/// Record encoding of a sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Text,
    Json,
}

/// How the logger name appears in records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMode {
    None,
    /// Last `::` segment of the identity
    #[default]
    Short,
    Full,
}

impl NameMode {
    pub fn apply(&self, identity: &str) -> Option<String> {
        match self {
            NameMode::None => None,
            NameMode::Short => Some(
                identity
                    .rsplit("::")
                    .next()
                    .unwrap_or(identity)
                    .to_string(),
            ),
            NameMode::Full => Some(identity.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub stream: ConsoleStream,
    pub encoding: Encoding,
}

/// Rotating file sink settings; no path means no file sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(alias = "filename")]
    pub path: Option<PathBuf>,
    /// Size in megabytes that triggers rotation
    #[serde(alias = "maxsize")]
    pub max_size_mb: u64,
    /// Backups older than this many days are removed; 0 keeps them forever
    #[serde(alias = "maxage")]
    pub max_age_days: u64,
    /// Backups kept after rotation; 0 keeps them all
    #[serde(alias = "maxbackups")]
    pub max_backups: usize,
    /// Name backups with local time instead of UTC
    #[serde(alias = "localtime")]
    pub local_time: bool,
    pub compress: bool,
    pub encoding: Encoding,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_size_mb: 100,
            max_age_days: 30,
            max_backups: 30,
            local_time: false,
            compress: true,
            encoding: Encoding::Text,
        }
    }
}

/// Everything a logger needs to initialize
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    #[serde(alias = "level")]
    pub levels: LevelPatterns,
    pub console: ConsoleConfig,
    pub file: FileConfig,
    pub with_caller: bool,
    pub name_mode: NameMode,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_levels(mut self, levels: LevelPatterns) -> Self {
        self.levels = levels;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_console(mut self, stream: ConsoleStream, encoding: Encoding) -> Self {
        self.console = ConsoleConfig { stream, encoding };
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.file = file;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_caller(mut self, enabled: bool) -> Self {
        self.with_caller = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_name_mode(mut self, mode: NameMode) -> Self {
        self.name_mode = mode;
        self
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants that serde cannot express.
    ///
    /// Level rules are validated when they are built; this covers the
    /// file sink.
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(LoggerError::config("levels", "no level rules"));
        }

        if let Some(path) = &self.file.path {
            if path.as_os_str().is_empty() {
                return Err(LoggerError::config("file", "path is empty"));
            }
            if self.file.max_size_mb == 0 {
                return Err(LoggerError::config("file", "max_size_mb must be positive"));
            }
        }
        Ok(())
    }
}

/// Something a logger can read its configuration from at first use
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<LoggerConfig>;
}

impl ConfigSource for LoggerConfig {
    fn load(&self) -> Result<LoggerConfig> {
        self.validate()?;
        Ok(self.clone())
    }
}

impl<F> ConfigSource for F
where
    F: Fn() -> Result<LoggerConfig> + Send + Sync,
{
    fn load(&self) -> Result<LoggerConfig> {
        let config = self()?;
        config.validate()?;
        Ok(config)
    }
}

/// JSON configuration file read on every `load`
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for JsonFileSource {
    fn load(&self) -> Result<LoggerConfig> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                self.path.display().to_string(),
                e,
            )
        })?;
        LoggerConfig::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.levels.default_level(), LogLevel::Info);
        assert_eq!(config.console.stream, ConsoleStream::No);
        assert_eq!(config.file.max_size_mb, 100);
        assert!(config.file.compress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = LoggerConfig::from_json_str(
            r#"{
                "levels": {"*": "warn", "app::db::*": "debug"},
                "console": {"stream": "stderr", "encoding": "json"},
                "file": {"path": "/tmp/app.log", "maxsize": 5, "compress": false},
                "with_caller": true,
                "name_mode": "full"
            }"#,
        )
        .unwrap();

        assert_eq!(config.levels.resolve("app::db::Pool"), LogLevel::Debug);
        assert_eq!(config.levels.resolve("app::http"), LogLevel::Warn);
        assert_eq!(config.console.stream, ConsoleStream::Stderr);
        assert_eq!(config.console.encoding, Encoding::Json);
        assert_eq!(config.file.max_size_mb, 5);
        assert_eq!(config.file.max_backups, 30);
        assert!(!config.file.compress);
        assert!(config.with_caller);
        assert_eq!(config.name_mode, NameMode::Full);
    }

    #[test]
    fn test_missing_default_level_is_config_error() {
        let result = LoggerConfig::from_json_str(r#"{"levels": {"app::*": "debug"}}"#);
        assert!(matches!(result, Err(LoggerError::JsonError(_))));
    }

    #[test]
    fn test_zero_file_size_rejected() {
        let config = LoggerConfig::default().with_file(FileConfig {
            path: Some("app.log".into()),
            max_size_mb: 0,
            ..FileConfig::default()
        });
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_name_mode() {
        assert_eq!(NameMode::None.apply("app::db::Pool"), None);
        assert_eq!(NameMode::Short.apply("app::db::Pool"), Some("Pool".into()));
        assert_eq!(NameMode::Short.apply("Pool"), Some("Pool".into()));
        assert_eq!(
            NameMode::Full.apply("app::db::Pool"),
            Some("app::db::Pool".into())
        );
    }

    #[test]
    fn test_closure_source_is_validated() {
        let source = || -> Result<LoggerConfig> {
            Ok(LoggerConfig::default().with_file(FileConfig {
                path: Some(PathBuf::new()),
                ..FileConfig::default()
            }))
        };
        assert!(source.load().is_err());
    }

    #[test]
    fn test_json_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"levels": {{"*": "error"}}}}"#).unwrap();

        let source = JsonFileSource::new(file.path());
        let config = source.load().unwrap();
        assert_eq!(config.levels.default_level(), LogLevel::Error);

        let missing = JsonFileSource::new(file.path().with_extension("absent"));
        assert!(matches!(missing.load(), Err(LoggerError::IoOperation { .. })));
    }
}
