//! Runtime level control example
//!
//! Shows glob level rules, a temporary override that rolls back on its own,
//! and broadcasting a change to every matching logger.
//!
//! Run with: cargo run --example runtime_levels

use owner_logger_system::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Owner Logger System - Runtime Levels Example ===\n");

    let levels = LevelPatterns::from_rules([
        ("*", LogLevel::Info),
        ("billing::*", LogLevel::Warn),
        ("billing::Ledger", LogLevel::Error),
    ])?;
    let registry = Registry::new(
        LoggerConfig::default()
            .with_levels(levels)
            .with_console(ConsoleStream::Stdout, Encoding::Text)
            .with_name_mode(NameMode::Full),
    );

    let ledger = registry.get_or_create("billing::Ledger");
    let invoices = registry.get_or_create("billing::Invoices");
    let search = registry.get_or_create("catalog::Search");

    println!("1. Levels resolved by the longest matching pattern:");
    for logger in [&ledger, &invoices, &search] {
        println!("   {:<20} {}", logger.identity(), logger.level()?);
    }

    println!("\n2. Debug billing for 300ms:");
    let changed =
        registry.temporary_set_level("billing::*", LogLevel::Debug, Duration::from_millis(300))?;
    println!("   {} loggers overridden", changed);
    ledger.debug(&args!["visible during the override"]);

    thread::sleep(Duration::from_millis(400));
    ledger.debug(&args!["hidden again after rollback"]);
    println!("   ledger is back at {}", ledger.level()?);

    println!("\n3. Permanent broadcast:");
    registry.set_level("*", LogLevel::Error)?;
    search.warn(&args!["hidden"]);
    search.error(&args!["visible"]);

    registry.sync()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
