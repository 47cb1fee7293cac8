//! Rotating file appender with size-based rotation
//!
//! When the active file would exceed its size limit it is renamed to a
//! timestamped backup (`<stem>-<time>.<ext>`), optionally gzip-compressed,
//! and old backups are pruned by count and by age.

use crate::core::appender::Appender;
use crate::core::config::{Encoding, FileConfig};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::LogEntry;
use chrono::{Local, NaiveDateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Time layout embedded in backup file names
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Rotation and retention settings
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    /// `None` keeps backups regardless of age
    pub max_age: Option<Duration>,
    /// 0 keeps every backup
    pub max_backups: usize,
    pub local_time: bool,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from_config(&FileConfig::default())
    }
}

impl RotationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            max_bytes: config.max_size_mb.saturating_mul(BYTES_PER_MB),
            max_age: (config.max_age_days > 0)
                .then(|| Duration::from_secs(config.max_age_days.saturating_mul(SECS_PER_DAY))),
            max_backups: config.max_backups,
            local_time: config.local_time,
            compress: config.compress,
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, age: Option<Duration>) -> Self {
        self.max_age = age;
        self
    }

    #[must_use]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.local_time = enabled;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    encoding: Encoding,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFileAppender {
    /// Create an appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if the file or its directory cannot be created
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Build the file sink described by a logger configuration.
    ///
    /// # Errors
    ///
    /// Returns error if no path is configured or the file cannot be opened
    pub fn from_config(config: &FileConfig) -> Result<Self> {
        let path = config
            .path
            .as_ref()
            .ok_or_else(|| LoggerError::config("file", "no path configured"))?;
        Ok(Self::with_policy(path, RotationPolicy::from_config(config))?
            .with_encoding(config.encoding))
    }

    /// # Errors
    ///
    /// Returns error if the file or its directory cannot be created
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_file(&base_path)?;
        Ok(Self {
            base_path,
            policy,
            encoding: Encoding::Text,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn open_file(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size > 0 && self.current_size + incoming > self.policy.max_bytes
    }

    /// `<stem>-` and `.<ext>` that every backup name is built from
    fn backup_affixes(&self) -> (String, String) {
        let stem = self
            .base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .base_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (format!("{}-", stem), ext)
    }

    /// Whether `name` was produced by [`Self::backup_path`], with or without
    /// the `.gz` suffix. Sibling files sharing the stem do not qualify.
    fn is_backup_name(&self, name: &str) -> bool {
        let (prefix, ext) = self.backup_affixes();
        let name = name.strip_suffix(".gz").unwrap_or(name);
        let Some(stamp) = name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(ext.as_str()))
        else {
            return false;
        };

        let parses = |text: &str| NaiveDateTime::parse_from_str(text, BACKUP_TIME_FORMAT).is_ok();
        parses(stamp)
            || stamp.rsplit_once('-').map_or(false, |(time, counter)| {
                !counter.is_empty() && counter.bytes().all(|b| b.is_ascii_digit()) && parses(time)
            })
    }

    fn backup_path(&self) -> PathBuf {
        let stamp = if self.policy.local_time {
            Local::now().format(BACKUP_TIME_FORMAT).to_string()
        } else {
            Utc::now().format(BACKUP_TIME_FORMAT).to_string()
        };
        let (prefix, ext) = self.backup_affixes();

        let mut candidate = self.base_path.with_file_name(format!("{}{}{}", prefix, stamp, ext));
        let mut counter = 1;
        while candidate.exists() || Self::gz_path(&candidate).exists() {
            candidate = self
                .base_path
                .with_file_name(format!("{}{}-{}{}", prefix, stamp, counter, ext));
            counter += 1;
        }
        candidate
    }

    fn gz_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let backup = self.backup_path();
        fs::rename(&self.base_path, &backup).map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to rename to '{}': {}", backup.display(), e),
            )
        })?;

        let (file, size) = Self::open_file(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        if self.policy.compress {
            if let Err(e) = Self::compress_file(&backup) {
                eprintln!("[LOGGER ERROR] Backup compression failed: {}", e);
            }
        }
        self.prune_backups();
        Ok(())
    }

    /// Compress a backup using streaming I/O.
    ///
    /// The original is removed only after the `.gz` is complete and renamed
    /// into place.
    fn compress_file(path: &Path) -> Result<()> {
        use std::io::{BufReader, Read};

        let gz_path = Self::gz_path(path);
        let mut temp_name = gz_path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_gz_path = PathBuf::from(temp_name);

        let input = File::open(path).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to open file for compression: {}", path.display()),
                e,
            )
        })?;
        let mut reader = BufReader::with_capacity(64 * 1024, input);

        let output = File::create(&temp_gz_path).map_err(|e| {
            LoggerError::io_operation(
                "compress log file",
                format!(
                    "Failed to create temporary compressed file: {}",
                    temp_gz_path.display()
                ),
                e,
            )
        })?;
        let mut encoder = flate2::write::GzEncoder::new(
            BufWriter::with_capacity(64 * 1024, output),
            flate2::Compression::default(),
        );

        let mut buffer = vec![0u8; 64 * 1024];
        let streamed: std::io::Result<()> = (|| {
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                encoder.write_all(&buffer[..bytes_read])?;
            }
            encoder.finish()?.flush()
        })();

        if let Err(e) = streamed {
            let _ = fs::remove_file(&temp_gz_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
            let _ = fs::remove_file(&temp_gz_path);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to rename compressed file to: {}", gz_path.display()),
                e,
            )
        })?;

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER ERROR] Compressed {} but could not remove the original: {}",
                path.display(),
                e
            );
        }
        Ok(())
    }

    /// Backups of this file, newest first
    pub fn backups(&self) -> Vec<PathBuf> {
        let dir = match self.base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut backups: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !self.is_backup_name(&name) {
                    return None;
                }
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, entry.path()))
            })
            .filter(|(_, path)| path != &self.base_path)
            .collect();

        backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        backups.into_iter().map(|(_, path)| path).collect()
    }

    fn prune_backups(&self) {
        let now = SystemTime::now();
        for (index, path) in self.backups().into_iter().enumerate() {
            let over_count = self.policy.max_backups > 0 && index >= self.policy.max_backups;
            let too_old = self.policy.max_age.map_or(false, |max_age| {
                fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .map_or(false, |age| age > max_age)
            });

            if over_count || too_old {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER ERROR] Failed to remove old backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = self.encoding.encode(entry);
        line.push('\n');
        let bytes = line.len() as u64;

        if self.should_rotate(bytes) {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER ERROR] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    let (file, size) = Self::open_file(&self.base_path)?;
                    self.writer = Some(BufWriter::new(file));
                    self.current_size = size;
                }
                // Let the file grow instead of retrying on every record
                self.current_size = 0;
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += bytes;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
