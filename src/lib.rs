//! Structured logging for network services.
//!
//! Builds a [`Logger`](observability::Logger) from a
//! [`LoggingConfig`](config::LoggingConfig): JSON lines or colorized console
//! output on stdout, an optional size-rotated JSON file, hostname/pid context,
//! and per-request `reqId` tagging. Records are ordinary `tracing` events.

pub mod config;
pub mod http;
pub mod observability;

pub use config::{LoggingConfig, ServiceConfig};
pub use observability::{with_request_id, Logger, LoggingError, Severity};
