//! Shared utilities for integration tests.

use service_logger::observability::MemoryWriter;
use service_logger::{Logger, LoggingConfig};

/// Build a logger exactly as `Logger::new` does, with stdout captured.
pub fn capture_logger(config: &LoggingConfig) -> (Logger, MemoryWriter) {
    let console = MemoryWriter::new();
    let logger = Logger::with_console(console.clone(), config).unwrap();
    (logger, console)
}
