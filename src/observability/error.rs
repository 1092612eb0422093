//! Error types for logger construction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while configuring the logger.
///
/// Emitting records never fails from the caller's point of view; these only
/// come out of level parsing and sink assembly.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A level name that does not map to any [`Severity`](super::Severity).
    #[error("unknown log level: {0}")]
    UnknownSeverity(String),

    /// The log file (or its parent directory) could not be opened or created.
    #[error("failed to open log file {}: {source}", path.display())]
    SinkInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
