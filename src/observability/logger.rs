//! Logger assembly.
//!
//! # Responsibilities
//! - Build one fmt layer per sink: the console always, the rotated file when enabled
//! - Give every sink the configured minimum severity
//! - Attach `hostname` and `pid` outside pretty mode
//! - Record call sites when debug is on
//!
//! # Design Decisions
//! - The fan-out is a `tracing_subscriber` registry; each layer writes on its
//!   own, so one failing sink never blocks the others
//! - Field attachment is a span: entering it never mutates the logger
//! - The logger is a `Dispatch` value, installed globally only by the binary
//!
//! # Data Flow
//! ```text
//! LoggingConfig
//!     → compose_layers (console layer + optional file layer, SeverityFilter each)
//!     → registry
//!     → Logger (Dispatch)
//! ```

use std::ffi::OsString;
use std::io;

use serde_json::{Map, Value};
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing::Span;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::LoggingConfig;
use crate::observability::error::LoggingError;
use crate::observability::format::{ConsoleFields, ConsoleFormat, JsonFormat};
use crate::observability::rotation::open_log_file;
use crate::observability::severity::SeverityFilter;

pub const HOSTNAME_KEY: &str = "hostname";
pub const PID_KEY: &str = "pid";

/// Key of the request correlation field.
pub const REQUEST_ID_KEY: &str = "reqId";

/// Hostname written when the lookup fails.
pub const UNKNOWN_HOST: &str = "unknown";

/// A sink: one formatting layer with its own filter.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Span carrying `reqId`; records emitted inside it are tagged with the ID.
///
/// The ID is not validated.
pub fn with_request_id(req_id: &str) -> Span {
    tracing::info_span!("request", reqId = req_id)
}

/// `hostname` and `pid` for the current process.
pub fn base_fields() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        HOSTNAME_KEY.into(),
        Value::String(host_or_unknown(hostname::get())),
    );
    fields.insert(PID_KEY.into(), Value::from(std::process::id()));
    fields
}

fn host_or_unknown(lookup: io::Result<OsString>) -> String {
    lookup
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

/// Build the sinks for `config`, writing console output to `console`.
///
/// Fails only if the log file cannot be opened.
pub fn compose_layers<W>(console: W, config: &LoggingConfig) -> Result<Vec<BoxedLayer>, LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let static_fields = if config.pretty { Map::new() } else { base_fields() };
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    if config.pretty {
        layers.push(
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormat::new(config.debug))
                .fmt_fields(ConsoleFields)
                .with_writer(console)
                .with_filter(SeverityFilter::new(config.level))
                .boxed(),
        );
    } else {
        layers.push(structured_layer(console, static_fields.clone(), config));
    }

    if config.file.enabled {
        let file = open_log_file(&config.file)?;
        layers.push(structured_layer(file, static_fields, config));
    }
    Ok(layers)
}

fn structured_layer<W>(writer: W, static_fields: Map<String, Value>, config: &LoggingConfig) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(JsonFormat::new(static_fields, config.debug))
        .fmt_fields(JsonFields::new())
        .with_writer(writer)
        .with_filter(SeverityFilter::new(config.level))
        .boxed()
}

/// The assembled logger.
///
/// Cheap to clone; clones share sinks. Use [`Logger::set_default`] or
/// [`Logger::in_scope`] to route `tracing` events through it.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Build a logger for `config` with stdout as the console.
    pub fn new(config: &LoggingConfig) -> Result<Self, LoggingError> {
        Self::with_console(io::stdout, config)
    }

    /// Build a logger whose console output goes to `console`.
    pub fn with_console<W>(console: W, config: &LoggingConfig) -> Result<Self, LoggingError>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layers = compose_layers(console, config)?;
        let subscriber = tracing_subscriber::registry().with(layers);
        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this logger as the current thread's default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the current thread's default until the guard drops.
    pub fn set_default(&self) -> DefaultGuard {
        dispatcher::set_default(&self.dispatch)
    }
}

/// Log at FATAL, then exit the process with status 1.
///
/// Accepts `key = value,` fields followed by a format string.
#[macro_export]
macro_rules! log_fatal {
    ($($key:ident = $value:expr,)* $msg:literal $(, $arg:expr)* $(,)?) => {{
        ::tracing::error!(
            target: $crate::observability::FATAL_TARGET,
            $($key = $value,)* $msg $(, $arg)*
        );
        ::std::process::exit(1)
    }};
}

/// Log at PANIC, then panic with the message.
#[macro_export]
macro_rules! log_panic {
    ($($key:ident = $value:expr,)* $msg:literal $(, $arg:expr)* $(,)?) => {{
        ::tracing::error!(
            target: $crate::observability::PANIC_TARGET,
            $($key = $value,)* $msg $(, $arg)*
        );
        ::std::panic!($msg $(, $arg)*)
    }};
}
