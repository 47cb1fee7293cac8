//! Stress tests for concurrent registry and level control
//!
//! These tests verify:
//! - Racing first callers receive one instance and initialization runs once
//! - Logging from many threads while levels change underneath
//! - Overrides and broadcasts racing each other leave a consistent state
//! - File output keeps every record under concurrent writers

use owner_logger_system::core::error::Result;
use owner_logger_system::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Every racing first caller gets the same instance, initialized once
#[test]
fn test_concurrent_get_or_create_single_instance() {
    const THREADS: usize = 32;

    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let registry = Registry::new(move || -> Result<LoggerConfig> {
        counter.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which racing callers wait on initialization
        thread::sleep(Duration::from_millis(20));
        Ok(LoggerConfig::default())
    });

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let logger = registry.get_or_create("app::Contended");
                logger.info(&args!["first use"]);
                logger
            })
        })
        .collect();

    let loggers: Vec<Logger> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    for logger in &loggers[1..] {
        assert!(loggers[0].same_instance(logger));
    }
    assert_eq!(registry.len(), 1);
    assert_eq!(loads.load(Ordering::SeqCst), 1, "initialization ran more than once");
}

/// Many identities created concurrently each appear exactly once
#[test]
fn test_concurrent_distinct_identities() {
    const THREADS: usize = 8;
    const IDENTITIES: usize = 50;

    let registry = Registry::new(LoggerConfig::default());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..IDENTITIES {
                    registry.get_or_create(&format!("svc::Worker{}", i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
    assert_eq!(registry.len(), IDENTITIES);
}

/// Records from many threads all reach the file
#[test]
fn test_concurrent_logging_to_file() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");
    let registry = Registry::new(LoggerConfig::default().with_file(FileConfig {
        path: Some(log_file.clone()),
        ..FileConfig::default()
    }));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = registry.get_or_create("app::Shared");
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.infow("tick", &args!["thread", t, "seq", i]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
    registry.sync().expect("Failed to sync");

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), THREADS * PER_THREAD);
}

/// Overrides, broadcasts and logging racing each other settle cleanly
#[test]
fn test_overrides_racing_broadcasts() {
    const ROUNDS: usize = 200;

    let registry = Registry::new(LoggerConfig::default());
    for i in 0..4 {
        registry.get_or_create(&format!("race::Node{}", i));
    }

    let overrider = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..ROUNDS {
                let logger = registry.get_or_create(&format!("race::Node{}", i % 4));
                logger
                    .temporary_set_level(LogLevel::Debug, Duration::from_millis(5))
                    .unwrap();
            }
        })
    };
    let broadcaster = {
        let registry = registry.clone();
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                registry
                    .temporary_set_level("race::*", LogLevel::Error, Duration::from_millis(3))
                    .unwrap();
            }
        })
    };
    let writer = {
        let logger = registry.get_or_create("race::Node0");
        thread::spawn(move || {
            for i in 0..ROUNDS {
                logger.debugw("racing", &args!["i", i]);
            }
        })
    };

    for handle in [overrider, broadcaster, writer] {
        handle.join().expect("thread panicked");
    }

    // Every chain of overrides started from Info, so all roll back to it
    thread::sleep(Duration::from_millis(200));
    for identity in registry.identities() {
        let logger = registry.get_or_create(&identity);
        assert_eq!(logger.level().unwrap(), LogLevel::Info, "{} did not roll back", identity);
        assert!(!logger.has_pending_override());
    }
}

/// Permanent broadcast while overrides are pending wins over every rollback
#[test]
fn test_permanent_broadcast_cancels_pending_overrides() {
    let registry = Registry::new(LoggerConfig::default());
    let loggers: Vec<Logger> = (0..10)
        .map(|i| registry.get_or_create(&format!("cancel::Unit{}", i)))
        .collect();

    for logger in &loggers {
        logger
            .temporary_set_level(LogLevel::Debug, Duration::from_millis(50))
            .unwrap();
    }
    assert_eq!(registry.set_level("cancel::*", LogLevel::Warn).unwrap(), 10);

    thread::sleep(Duration::from_millis(150));
    for logger in &loggers {
        assert_eq!(logger.level().unwrap(), LogLevel::Warn);
    }
}
