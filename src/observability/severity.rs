//! Log severity levels.
//!
//! # Responsibilities
//! - Define the ordered severity scale used for filtering
//! - Parse textual level names from configuration and CLI flags
//! - Provide the labels each encoder prints
//! - Map `tracing` metadata onto the scale and filter events per sink
//!
//! # Design Decisions
//! - Parsing is case-insensitive; unknown names are an error, never a default
//! - Serde goes through the same parser so bad config fails at load time
//! - `tracing` stops at ERROR, so FATAL and PANIC events are ERROR events
//!   emitted under a reserved target

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::subscriber::Interest;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter};

use crate::observability::error::LoggingError;

/// Ordered log severity. A sink admits records at or above its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Fatal,
    Panic,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
        Severity::Panic,
    ];

    /// Lower-case label written into structured records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }

    /// Upper-case label used by the console encoder.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Panic => "PANIC",
        }
    }
}

/// Target of events emitted by [`log_fatal!`](crate::log_fatal).
pub const FATAL_TARGET: &str = "service_logger::fatal";

/// Target of events emitted by [`log_panic!`](crate::log_panic).
pub const PANIC_TARGET: &str = "service_logger::panic";

impl Severity {
    /// Severity of a `tracing` event. TRACE folds into DEBUG.
    pub fn of(meta: &Metadata<'_>) -> Severity {
        match meta.target() {
            FATAL_TARGET => Severity::Fatal,
            PANIC_TARGET => Severity::Panic,
            _ => match *meta.level() {
                Level::ERROR => Severity::Error,
                Level::WARN => Severity::Warning,
                Level::INFO => Severity::Info,
                _ => Severity::Debug,
            },
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a level name to a [`Severity`].
///
/// Accepts `DEBUG`, `INFO`, `WARNING`, `ERROR`, `FATAL` and `PANIC` in any
/// letter case.
pub fn parse_severity(name: &str) -> Result<Severity, LoggingError> {
    match name.to_uppercase().as_str() {
        "DEBUG" => Ok(Severity::Debug),
        "INFO" => Ok(Severity::Info),
        "WARNING" => Ok(Severity::Warning),
        "ERROR" => Ok(Severity::Error),
        "FATAL" => Ok(Severity::Fatal),
        "PANIC" => Ok(Severity::Panic),
        _ => Err(LoggingError::UnknownSeverity(name.to_string())),
    }
}

impl FromStr for Severity {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_severity(s)
    }
}

impl TryFrom<String> for Severity {
    type Error = LoggingError;

    fn try_from(value: String) -> Result<Self, LoggingError> {
        parse_severity(&value)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        // Round-trips through parse_severity, so use the full WARNING name.
        match severity {
            Severity::Warning => "warning".to_string(),
            other => other.as_str().to_string(),
        }
    }
}

/// Per-sink minimum severity.
///
/// Spans always pass so their fields reach events that do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityFilter {
    min: Severity,
}

impl SeverityFilter {
    pub fn new(min: Severity) -> Self {
        Self { min }
    }

    pub fn admits(&self, meta: &Metadata<'_>) -> bool {
        meta.is_span() || Severity::of(meta) >= self.min
    }
}

impl<S> Filter<S> for SeverityFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.admits(meta)
    }

    fn callsite_enabled(&self, meta: &'static Metadata<'static>) -> Interest {
        if self.admits(meta) {
            Interest::always()
        } else {
            Interest::never()
        }
    }
}
