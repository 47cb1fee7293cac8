//! File logging example
//!
//! Loads the configuration from a JSON file and writes JSON records to a
//! size-rotated, compressed log file next to console text output.
//!
//! Run with: cargo run --example file_logging

use owner_logger_system::prelude::*;

const CONFIG: &str = r#"{
    "levels": {"*": "info", "shop::db::*": "debug"},
    "console": {"stream": "stderr", "encoding": "text"},
    "file": {
        "path": "logs/application.log",
        "max_size_mb": 1,
        "max_backups": 5,
        "max_age_days": 7,
        "compress": true,
        "encoding": "json"
    },
    "name_mode": "full"
}"#;

fn main() -> Result<()> {
    println!("=== Owner Logger System - File Logging Example ===\n");

    std::fs::write("logging.json", CONFIG)?;
    let registry = Registry::new(JsonFileSource::new("logging.json"));

    let db = registry.get_or_create("shop::db::Pool");
    let http = registry.get_or_create("shop::http::Server");

    println!("1. Logging to console and file:");
    http.info(&args!["Application started"]);
    db.debugw("opening connections", &args!["size", 8]);
    db.infow("Database connection established", &args!["host", "db-1"]);
    http.debug(&args!["not written, shop::http is at info"]);

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        http.infof("Processing item {}/5", &args![i]);
        if i == 3 {
            http.warnw("Item took longer than expected", &args!["item", i, "ms", 950]);
        }
    }

    // Flush every logger and surface any write error
    registry.sync()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/application.log' for the JSON records");

    Ok(())
}
