//! Process-diagnostic output sinks.
//!
//! Each sink owns its writer behind its own mutex; writes to one sink never
//! wait on another.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value, json};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, UtcTime};

use atlassian_config::LogLevel;

use super::TelemetryError;

/// Where a sink writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// Standard error. Always rendered as text.
    Stderr,
    /// An append-only file.
    File(Utf8PathBuf),
    /// A caller-supplied writer, identified by name.
    Writer(String),
}

/// Per-sink overrides of the router settings.
///
/// A sink level narrows what the sink writes; it cannot admit events the
/// router level already rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkOptions {
    /// Minimum severity for this sink. `None` follows the router.
    pub level: Option<LogLevel>,
    /// JSON records for this sink. `None` follows the router.
    pub structured: Option<bool>,
}

impl SinkOptions {
    /// Options for a sink writing at `level` and above.
    #[must_use]
    pub const fn at_level(level: LogLevel) -> Self {
        Self {
            level: Some(level),
            structured: None,
        }
    }

    /// Sets whether the sink writes JSON records.
    #[must_use]
    pub const fn structured(mut self, structured: bool) -> Self {
        self.structured = Some(structured);
        self
    }
}

/// One rendered diagnostic event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DiagnosticRecord {
    pub(crate) timestamp: String,
    pub(crate) level: LogLevel,
    pub(crate) logger: String,
    pub(crate) message: String,
    pub(crate) attributes: Map<String, Value>,
}

impl DiagnosticRecord {
    pub(crate) fn now(
        level: LogLevel,
        logger: impl Into<String>,
        message: String,
        attributes: Map<String, Value>,
    ) -> Self {
        let mut timestamp = String::new();
        if UtcTime::rfc_3339()
            .format_time(&mut Writer::new(&mut timestamp))
            .is_err()
        {
            timestamp = String::from("unknown-time");
        }
        Self {
            timestamp,
            level,
            logger: logger.into(),
            message,
            attributes,
        }
    }

    /// Single text line; carriage returns and newlines are escaped.
    pub(crate) fn render_text(&self) -> String {
        let mut line = format!(
            "{} {:<7} {}: {}",
            self.timestamp,
            self.level.to_string().to_ascii_uppercase(),
            self.logger,
            escape_line_breaks(&self.message)
        );
        for (key, value) in &self.attributes {
            let rendered = match value {
                Value::String(text) => escape_line_breaks(text),
                other => escape_line_breaks(&other.to_string()),
            };
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&rendered);
        }
        line.push('\n');
        line
    }

    /// Self-contained JSON record terminated by a newline.
    pub(crate) fn render_json(&self) -> String {
        let record = json!({
            "timestamp": self.timestamp,
            "level": self.level.to_string(),
            "logger": self.logger,
            "message": self.message,
            "attributes": self.attributes,
        });
        let mut line = record.to_string();
        line.push('\n');
        line
    }
}

fn escape_line_breaks(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

/// A destination for process-diagnostic records.
pub(crate) struct Sink {
    target: SinkTarget,
    options: SinkOptions,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    pub(crate) fn stderr() -> Self {
        Self::with_writer(SinkTarget::Stderr, Box::new(io::stderr()))
    }

    pub(crate) fn file(path: &Utf8Path, options: SinkOptions) -> Result<Self, TelemetryError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| TelemetryError::OpenSink {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::with_writer(SinkTarget::File(path.to_owned()), Box::new(file)).options(options))
    }

    pub(crate) fn with_writer(target: SinkTarget, writer: Box<dyn Write + Send>) -> Self {
        Self {
            target,
            options: SinkOptions::default(),
            writer: Mutex::new(writer),
        }
    }

    pub(crate) const fn options(mut self, options: SinkOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn target(&self) -> &SinkTarget {
        &self.target
    }

    /// Writes one record unless the sink level rejects it. `structured` is
    /// the router default; structured mode never applies to stderr.
    pub(crate) fn emit(&self, record: &DiagnosticRecord, structured: bool) {
        if self
            .options
            .level
            .is_some_and(|threshold| !record.level.admits(threshold))
        {
            return;
        }
        let structured = self.options.structured.unwrap_or(structured);
        let line = if structured && self.target != SinkTarget::Stderr {
            record.render_json()
        } else {
            record.render_text()
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush());
        // A failing diagnostic sink has nowhere to report to.
        drop(outcome);
    }
}
