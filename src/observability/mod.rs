//! Observability subsystem: the service logger.
//!
//! # Data Flow
//! ```text
//! LoggingConfig
//!     → severity.rs (level name → Severity, SeverityFilter per sink)
//!     → format.rs (pretty flag → ConsoleFormat or JsonFormat)
//!     → rotation.rs (optional size-rotated file writer)
//!     → logger.rs (one fmt layer per sink on a registry → Logger)
//!
//! Callers:
//!     → tracing::info!(...) and friends, log_fatal!/log_panic!
//!     → with_request_id(id) spans tag everything emitted inside them
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON lines) for machine parsing, console lines for people
//! - Files are always structured, whatever the console does
//! - Request ID flows through spans, never shared mutable state

pub mod capture;
pub mod error;
pub mod format;
pub mod logger;
pub mod rotation;
pub mod severity;

pub use capture::MemoryWriter;
pub use error::LoggingError;
pub use format::{ConsoleFields, ConsoleFormat, JsonFormat};
pub use logger::{base_fields, compose_layers, with_request_id, BoxedLayer, Logger, REQUEST_ID_KEY};
pub use rotation::{max_size_bytes, open_log_file};
pub use severity::{parse_severity, Severity, SeverityFilter, FATAL_TARGET, PANIC_TARGET};
