//! Dual-channel logging.
//!
//! The process-diagnostic hierarchy carries server operational logs: `tracing`
//! events whose target lies inside the server's namespaces, rendered by
//! [`DiagnosticLayer`] to standard error and optional files. The
//! caller-visible hierarchy carries per-invocation log and progress events
//! through [`CallerLog`] to a transport-provided [`ProgressSink`]. The two
//! never forward to each other.

mod caller;
mod layer;
mod redaction;
mod router;
mod sink;

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

pub use caller::{CallerEvent, CallerLog, ProgressSink, TRACE_PREFIX};
pub use layer::DiagnosticLayer;
pub use redaction::Redactor;
pub use router::{InitMode, Installation, LogSettings, LoggingRouter};
pub use sink::{SinkOptions, SinkTarget};

pub(crate) const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A file sink could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    OpenSink {
        /// Path of the sink.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
