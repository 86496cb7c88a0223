//! Caller-visible log and progress channel.
//!
//! A [`CallerLog`] belongs to one invocation. It writes only to the
//! [`ProgressSink`] the transport supplied for that invocation and never
//! emits `tracing` events, so nothing logged here can surface in the
//! process-diagnostic sinks.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use atlassian_config::LogLevel;

use super::redaction::Redactor;

/// Prefix marking trace detail on a wire that has no trace level.
pub const TRACE_PREFIX: &str = "[TRACE] ";

/// Event delivered to the invoking caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CallerEvent {
    /// A log line. `level` is never [`LogLevel::Trace`].
    Log {
        /// Wire severity.
        level: LogLevel,
        /// Message text after redaction.
        message: String,
        /// Structured attributes after redaction.
        attributes: Map<String, Value>,
    },
    /// Progress of a long-running command.
    Progress {
        /// Units completed.
        progress: u64,
        /// Total units, when known.
        total: Option<u64>,
        /// Optional status text.
        message: Option<String>,
    },
}

/// Transport-provided destination for caller-visible events.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event. Must not block on the caller.
    fn deliver(&self, event: CallerEvent);
}

/// Per-invocation handle onto the caller-visible channel.
#[derive(Clone)]
pub struct CallerLog {
    sink: Arc<dyn ProgressSink>,
    threshold: LogLevel,
    redactor: Option<Arc<Redactor>>,
}

impl fmt::Debug for CallerLog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CallerLog")
            .field("threshold", &self.threshold)
            .field("redaction", &self.redactor.is_some())
            .finish_non_exhaustive()
    }
}

impl CallerLog {
    pub(crate) fn new(
        sink: Arc<dyn ProgressSink>,
        threshold: LogLevel,
        redactor: Option<Arc<Redactor>>,
    ) -> Self {
        Self {
            sink,
            threshold,
            redactor,
        }
    }

    /// Minimum severity delivered to the caller.
    #[must_use]
    pub const fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Returns `true` when events at `level` reach the caller.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.admits(self.threshold)
    }

    /// Logs a message with attributes.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, attributes: Map<String, Value>) {
        if !self.enabled(level) {
            return;
        }
        let message = message.into();
        let (level, message) = match level {
            LogLevel::Trace => (LogLevel::Debug, format!("{TRACE_PREFIX}{message}")),
            other => (other, message),
        };
        let mut attributes = attributes;
        let message = match &self.redactor {
            Some(redactor) => {
                redactor.redact_attributes(&mut attributes);
                redactor.redact(&message).into_owned()
            }
            None => message,
        };
        self.sink.deliver(CallerEvent::Log {
            level,
            message,
            attributes,
        });
    }

    /// Logs at trace level, delivered as debug with a `[TRACE] ` prefix.
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message, Map::new());
    }

    /// Logs at debug level.
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, Map::new());
    }

    /// Logs at info level.
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, Map::new());
    }

    /// Logs at warning level.
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, Map::new());
    }

    /// Logs at error level.
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, Map::new());
    }

    /// Reports progress. Progress is not subject to the level threshold.
    pub fn progress(&self, progress: u64, total: Option<u64>, message: Option<&str>) {
        let message = message.map(|text| match &self.redactor {
            Some(redactor) => redactor.redact(text).into_owned(),
            None => text.to_owned(),
        });
        self.sink.deliver(CallerEvent::Progress {
            progress,
            total,
            message,
        });
    }
}
