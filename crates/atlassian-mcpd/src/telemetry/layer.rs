//! `tracing` layer feeding the process-diagnostic sinks.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::Context;

use atlassian_config::LogLevel;

use super::router::RouterState;
use super::sink::DiagnosticRecord;

/// Target prefixes owned by the server. Events from other crates stop at
/// this boundary.
const NAMESPACES: [&str; 3] = [env!("CARGO_PKG_NAME"), "atlassian_mcpd", "atlassian_config"];

/// Admits the server's own targets at every level and nothing else.
pub(crate) fn namespace_filter() -> Targets {
    Targets::new().with_targets(NAMESPACES.map(|namespace| (namespace, LevelFilter::TRACE)))
}

pub(crate) fn level_from_tracing(level: Level) -> LogLevel {
    if level == Level::ERROR {
        LogLevel::Error
    } else if level == Level::WARN {
        LogLevel::Warning
    } else if level == Level::INFO {
        LogLevel::Info
    } else if level == Level::DEBUG {
        LogLevel::Debug
    } else {
        LogLevel::Trace
    }
}

/// Layer rendering server events into the router's sinks.
///
/// Compose it into a host subscriber with
/// [`LoggingRouter::layer`](super::LoggingRouter::layer), or let
/// [`LoggingRouter::finalize`](super::LoggingRouter::finalize) install it.
pub struct DiagnosticLayer {
    state: Arc<RouterState>,
    namespaces: Targets,
}

impl DiagnosticLayer {
    pub(crate) fn new(state: Arc<RouterState>) -> Self {
        Self {
            state,
            namespaces: namespace_filter(),
        }
    }
}

impl fmt::Debug for DiagnosticLayer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("DiagnosticLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for DiagnosticLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self
            .namespaces
            .would_enable(metadata.target(), metadata.level())
        {
            return;
        }
        let level = level_from_tracing(*metadata.level());
        if !level.admits(self.state.level()) {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let record = DiagnosticRecord::now(
            level,
            metadata.target(),
            visitor.message,
            visitor.attributes,
        );
        self.state.emit(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    attributes: Map<String, Value>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
        } else {
            self.attributes.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_owned()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value)
            .map_or_else(|| Value::String(value.to_string()), Value::Number);
        self.put(field, value);
    }
}
