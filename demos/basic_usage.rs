//! Basic logger usage example
//!
//! Demonstrates per-owner loggers on the console, the three call shapes and
//! the formatting macros.
//!
//! Run with: cargo run --example basic_usage

use owner_logger_system::prelude::*;
use owner_logger_system::{info, warn};

struct OrderService;

fn main() -> Result<()> {
    println!("=== Owner Logger System - Basic Usage Example ===\n");

    let config = LoggerConfig::default()
        .with_levels(LevelPatterns::new(LogLevel::Debug)?)
        .with_console(ConsoleStream::Stdout, Encoding::Text)
        .with_caller(true);
    let registry = Registry::new(config);

    // One logger per owner type
    let logger = registry.logger_for::<OrderService>();

    println!("1. Call shapes:");
    logger.debug(&args!["positional", "arguments", 42]);
    logger.infof("order {} accepted for {}", &args![1001, "ada"]);
    logger.warnw("slow payment provider", &args!["provider", "acme", "ms", 812]);

    println!("\n2. Macros format only when the level is enabled:");
    info!(logger, "processed {} orders", 3);
    warn!(logger, "retry {} of {}", 1, 3);

    println!("\n3. Malformed context is reported, not fatal:");
    logger.errorw("refund failed", &args!["order", 1001, "dangling"]);

    println!("\n4. Raising the level hides verbose records:");
    logger.set_level(LogLevel::Warn)?;
    logger.info(&args!["hidden"]);
    logger.warn(&args!["visible"]);

    registry.sync()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
