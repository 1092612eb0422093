//! Event formats for the fmt layers.
//!
//! # Responsibilities
//! - Render one event as a JSON line (`JsonFormat`)
//! - Render one event as a colorized console line (`ConsoleFormat`)
//! - Format span fields for the console (`ConsoleFields`)
//!
//! # Design Decisions
//! - The pretty flag alone picks the format; files always get `JsonFormat`
//! - Span fields are folded in root first, then event fields; a repeated key
//!   keeps its first position and takes the last value
//! - ERROR and above carry a stack trace
//! - JSON time is integer epoch milliseconds, truncated toward zero

use std::backtrace::Backtrace;
use std::fmt;

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

use crate::observability::severity::Severity;

pub const LEVEL_KEY: &str = "level";
pub const TIME_KEY: &str = "time";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";
pub const STACKTRACE_KEY: &str = "stacktrace";

/// `15:04:05 PM`: 24-hour clock with a meridiem marker.
pub const CONSOLE_TIME_FORMAT: &str = "%H:%M:%S %p";

/// Lowest severity that carries a stack trace.
pub const STACKTRACE_LEVEL: Severity = Severity::Error;

/// Milliseconds since the Unix epoch, truncated toward zero.
pub fn unix_millis(time: &DateTime<Utc>) -> i64 {
    time.timestamp_nanos_opt()
        .map(|nanos| nanos / 1_000_000)
        .unwrap_or_else(|| time.timestamp_millis())
}

fn caller(meta: &Metadata<'_>) -> Option<String> {
    Some(format!("{}:{}", meta.file()?, meta.line()?))
}

/// Local wall clock for console lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleClock;

impl FormatTime for ConsoleClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format(CONSOLE_TIME_FORMAT))
    }
}

/// One JSON object per line.
///
/// Key order: `level`, `time`, `caller`, `msg`, static fields, span fields,
/// event fields, `stacktrace`. Span fields are read back from the
/// [`JsonFields`](tracing_subscriber::fmt::format::JsonFields) the layer
/// stored on each span.
#[derive(Debug, Clone, Default)]
pub struct JsonFormat {
    static_fields: Map<String, Value>,
    capture_caller: bool,
}

impl JsonFormat {
    pub fn new(static_fields: Map<String, Value>, capture_caller: bool) -> Self {
        Self {
            static_fields,
            capture_caller,
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let severity = Severity::of(meta);

        let mut record = Map::new();
        record.insert(LEVEL_KEY.into(), Value::from(severity.as_str()));
        record.insert(TIME_KEY.into(), Value::from(unix_millis(&Utc::now())));
        if self.capture_caller {
            if let Some(caller) = caller(meta) {
                record.insert(CALLER_KEY.into(), Value::String(caller));
            }
        }
        // Holds the position; filled in once the event is visited.
        record.insert(MESSAGE_KEY.into(), Value::String(String::new()));

        for (key, value) in &self.static_fields {
            record.insert(key.clone(), value.clone());
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<FormattedFields<N>>() else {
                    continue;
                };
                if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&fields.fields) {
                    record.extend(fields);
                }
            }
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            record.insert(MESSAGE_KEY.into(), Value::String(message));
        }
        record.extend(visitor.fields);

        if severity >= STACKTRACE_LEVEL {
            let trace = Backtrace::force_capture().to_string();
            record.insert(STACKTRACE_KEY.into(), Value::String(trace));
        }

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        // JSON has no NaN or infinity.
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

/// `time LEVEL [caller] msg k=v ...`, then the stack trace for ERROR and above.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormat {
    timer: ConsoleClock,
    capture_caller: bool,
}

impl ConsoleFormat {
    pub fn new(capture_caller: bool) -> Self {
        Self {
            timer: ConsoleClock,
            capture_caller,
        }
    }
}

fn colored_label(severity: Severity) -> ColoredString {
    let label = severity.label();
    match severity {
        Severity::Debug => label.magenta(),
        Severity::Info => label.blue(),
        Severity::Warning => label.yellow(),
        Severity::Error | Severity::Fatal | Severity::Panic => label.red(),
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let severity = Severity::of(meta);

        self.timer.format_time(&mut writer)?;
        write!(writer, " {}", colored_label(severity))?;
        if self.capture_caller {
            if let Some(caller) = caller(meta) {
                write!(writer, " {}", caller)?;
            }
        }

        let mut visitor = ConsoleVisitor::default();
        event.record(&mut visitor);
        write!(writer, " {}", visitor.message.unwrap_or_default())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                    if !fields.fields.is_empty() {
                        write!(writer, " {}", fields.fields)?;
                    }
                }
            }
        }
        for pair in &visitor.pairs {
            write!(writer, " {}", pair)?;
        }
        writeln!(writer)?;

        if severity >= STACKTRACE_LEVEL {
            writeln!(writer, "{}", Backtrace::force_capture().to_string().trim_end())?;
        }
        Ok(())
    }
}

/// Span fields as space-separated `key=value` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFields;

impl<'writer> FormatFields<'writer> for ConsoleFields {
    fn format_fields<R: RecordFields>(&self, mut writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = ConsoleVisitor::default();
        fields.record(&mut visitor);
        write!(writer, "{}", visitor.pairs.join(" "))
    }
}

#[derive(Default)]
struct ConsoleVisitor {
    message: Option<String>,
    pairs: Vec<String>,
}

impl ConsoleVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.pairs.push(format!("{}={}", field.name(), quote(value)));
        }
    }
}

impl Visit for ConsoleVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=')
}

fn quote(value: String) -> String {
    if needs_quoting(&value) {
        format!("{:?}", value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use tracing_subscriber::fmt::format::JsonFields;
    use tracing_subscriber::layer::SubscriberExt;

    use crate::observability::capture::MemoryWriter;

    fn json_subscriber(out: &MemoryWriter) -> impl Subscriber + Send + Sync {
        let mut statics = Map::new();
        statics.insert("service".into(), Value::from("billing"));
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(JsonFormat::new(statics, false))
                .fmt_fields(JsonFields::new())
                .with_writer(out.clone()),
        )
    }

    fn console_subscriber(out: &MemoryWriter, capture_caller: bool) -> impl Subscriber + Send + Sync {
        colored::control::set_override(false);
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormat::new(capture_caller))
                .fmt_fields(ConsoleFields)
                .with_writer(out.clone()),
        )
    }

    #[test]
    fn test_unix_millis_truncates() {
        let t = DateTime::from_timestamp_nanos(1_700_000_000_123_999_999);
        assert_eq!(unix_millis(&t), 1_700_000_000_123);

        // Toward zero, not floor.
        let t = DateTime::from_timestamp_nanos(-1_500_000);
        assert_eq!(unix_millis(&t), -1);
    }

    #[test]
    fn test_json_key_order_and_values() {
        let out = MemoryWriter::new();
        tracing::subscriber::with_default(json_subscriber(&out), || {
            let span = tracing::info_span!("request", reqId = "abc-123");
            let _entered = span.enter();
            tracing::info!(port = 8080u64, ratio = f64::NAN, ok = true, "listening on {}", "lo");
        });

        let line = &out.lines()[0];
        assert!(line.starts_with(r#"{"level":"info","time":"#), "{}", line);

        let record: Value = serde_json::from_str(line).unwrap();
        let keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["level", "time", "msg", "service", "reqId", "port", "ratio", "ok"]);
        assert_eq!(record["msg"], "listening on lo");
        assert_eq!(record["reqId"], "abc-123");
        assert_eq!(record["port"], 8080);
        assert_eq!(record["ratio"], "NaN");
        assert!(record["time"].is_i64());
    }

    #[test]
    fn test_json_last_write_wins() {
        let out = MemoryWriter::new();
        tracing::subscriber::with_default(json_subscriber(&out), || {
            let span = tracing::info_span!("outer", user = "alice", service = "edge");
            let _entered = span.enter();
            tracing::warn!(user = "bob", "switched");
        });

        let line = &out.lines()[0];
        let record: Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["user"], "bob");
        assert_eq!(record["service"], "edge");
        assert_eq!(record["level"], "warn");
        assert_eq!(line.matches("\"user\"").count(), 1);
    }

    #[test]
    fn test_json_stacktrace_only_from_error() {
        let out = MemoryWriter::new();
        tracing::subscriber::with_default(json_subscriber(&out), || {
            tracing::warn!("close");
            tracing::error!("broken");
        });

        let records = out.json_lines();
        assert!(records[0].get(STACKTRACE_KEY).is_none());
        assert!(records[1][STACKTRACE_KEY].is_string());
        let keys: Vec<&String> = records[1].as_object().unwrap().keys().collect();
        assert_eq!(keys.last().unwrap().as_str(), STACKTRACE_KEY);
    }

    #[test]
    fn test_console_line_layout() {
        let out = MemoryWriter::new();
        tracing::subscriber::with_default(console_subscriber(&out, false), || {
            let span = tracing::info_span!("request", reqId = "abc-123");
            let _entered = span.enter();
            tracing::info!(port = 8080u64, path = "/a b", empty = "", "started");
        });

        let line = &out.lines()[0];
        let (time, rest) = line.split_at(11);
        assert!(NaiveTime::parse_from_str(&time[..8], "%H:%M:%S").is_ok(), "{}", line);
        assert!(time.ends_with(" AM") || time.ends_with(" PM"), "{}", line);
        assert_eq!(rest, r#" INFO started reqId=abc-123 port=8080 path="/a b" empty="""#);
        assert!(!line.contains("hostname"));
    }

    #[test]
    fn test_console_caller_and_stacktrace() {
        let out = MemoryWriter::new();
        tracing::subscriber::with_default(console_subscriber(&out, true), || {
            tracing::error!("boom");
        });

        let lines = out.lines();
        assert!(lines[0].contains(" ERROR src/observability/format.rs:"), "{}", lines[0]);
        assert!(lines[0].ends_with(" boom"));
        assert!(lines.len() > 1, "stack trace expected after the error line");
    }

    #[test]
    fn test_quoting() {
        assert!(needs_quoting(""));
        assert!(needs_quoting("a b"));
        assert!(needs_quoting("k=v"));
        assert!(needs_quoting("say \"hi\""));
        assert!(!needs_quoting("plain"));
        assert_eq!(quote("a b".to_string()), "\"a b\"");
    }
}
