//! Record encoders for text and JSON sinks
//!
//! - Text: `[time] [LEVEL] name caller - message k=v ...`
//! - Json: one object per line, keys `time`, `level`, `logger`, `caller`,
//!   `msg`, then the record fields in order

use super::config::Encoding;
use super::field::format_fields;
use super::log_entry::LogEntry;
use colored::Colorize;

/// Timestamp layout shared by both encodings
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

impl Encoding {
    /// Encode a record as one line without the trailing newline
    pub fn encode(&self, entry: &LogEntry) -> String {
        match self {
            Encoding::Text => format_text(entry, false),
            Encoding::Json => format_json(entry),
        }
    }

    /// Like [`Encoding::encode`], coloring the level of text output
    pub fn encode_colored(&self, entry: &LogEntry) -> String {
        match self {
            Encoding::Text => format_text(entry, true),
            Encoding::Json => format_json(entry),
        }
    }
}

fn format_text(entry: &LogEntry, use_colors: bool) -> String {
    let level = format!("{:5}", entry.level.to_str());
    let level = if use_colors {
        level.color(entry.level.color_code()).to_string()
    } else {
        level
    };

    let mut line = format!("[{}] [{}]", entry.time.format(TIME_FORMAT), level);
    if let Some(ref name) = entry.logger_name {
        line.push(' ');
        line.push_str(name);
    }
    if let Some(caller) = entry.caller {
        line.push(' ');
        line.push_str(&caller.to_string());
    }
    line.push_str(" - ");
    line.push_str(&entry.message);

    if !entry.fields.is_empty() {
        line.push(' ');
        line.push_str(&format_fields(&entry.fields));
    }
    line
}

fn format_json(entry: &LogEntry) -> String {
    let mut json_obj = serde_json::Map::new();

    json_obj.insert(
        "time".to_string(),
        serde_json::Value::String(entry.time.format(TIME_FORMAT).to_string()),
    );
    json_obj.insert(
        "level".to_string(),
        serde_json::Value::String(entry.level.as_lowercase().to_string()),
    );
    if let Some(ref name) = entry.logger_name {
        json_obj.insert("logger".to_string(), serde_json::Value::String(name.clone()));
    }
    if let Some(caller) = entry.caller {
        json_obj.insert(
            "caller".to_string(),
            serde_json::Value::String(caller.to_string()),
        );
    }
    json_obj.insert(
        "msg".to_string(),
        serde_json::Value::String(entry.message.clone()),
    );

    // Fixed keys win over a field of the same name
    for field in &entry.fields {
        if !json_obj.contains_key(&field.key) {
            json_obj.insert(field.key.clone(), field.value.to_json_value());
        }
    }

    serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallerInfo, Field, LogLevel};

    fn sample() -> LogEntry {
        LogEntry::new(LogLevel::Warn, "cache miss")
            .with_logger_name(Some("Cache".into()))
            .with_fields(vec![Field::new("key", "user:7"), Field::new("ms", 12)])
    }

    #[test]
    fn test_text_format() {
        let line = Encoding::Text.encode(&sample());

        assert!(line.contains("[WARN ]"));
        assert!(line.contains(" Cache - cache miss"));
        assert!(line.ends_with("key=user:7 ms=12"));
    }

    #[test]
    fn test_text_format_with_caller() {
        let entry = sample().with_caller(Some(CallerInfo {
            file: "src/cache.rs",
            line: 42,
        }));
        let line = Encoding::Text.encode(&entry);
        assert!(line.contains("Cache src/cache.rs:42 - cache miss"));
    }

    #[test]
    fn test_json_format() {
        let line = Encoding::Json.encode(&sample());

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "warn");
        assert_eq!(parsed["logger"], "Cache");
        assert_eq!(parsed["msg"], "cache miss");
        assert_eq!(parsed["key"], "user:7");
        assert_eq!(parsed["ms"], 12);
        assert!(parsed["time"].is_string());
        assert!(parsed.get("caller").is_none());
    }

    #[test]
    fn test_json_key_order() {
        let line = Encoding::Json.encode(&sample());
        let keys: Vec<String> = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&line)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["time", "level", "logger", "msg", "key", "ms"]);
    }

    #[test]
    fn test_json_fixed_keys_not_overwritten() {
        let entry = LogEntry::new(LogLevel::Info, "real")
            .with_fields(vec![Field::new("msg", "spoofed")]);
        let parsed: serde_json::Value =
            serde_json::from_str(&Encoding::Json.encode(&entry)).unwrap();
        assert_eq!(parsed["msg"], "real");
    }

    #[test]
    fn test_json_is_never_colored() {
        let entry = sample();
        assert_eq!(
            Encoding::Json.encode_colored(&entry),
            Encoding::Json.encode(&entry)
        );
    }
}
