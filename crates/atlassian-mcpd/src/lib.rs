//! Command server for Jira and Confluence tools.
//!
//! A caller invokes a named, prefixed tool with a four-member envelope
//! (product, subject, parameters, response fields). The server resolves the
//! tool in a frozen registry, validates the envelope against the tool's
//! declared policy, runs the handler against the backend collaborator and
//! answers with exactly one [`ToolResult`](atlassian_mcp_types::ToolResult).
//!
//! Logging is split in two. Process diagnostics flow through `tracing` into
//! standard error and optional files. Per-invocation log and progress events
//! flow only to the invoking caller. The [`LoggingRouter`] owns both and is
//! configured explicitly, so a hosting framework may keep its own global
//! subscriber.
//!
//! The bundled binary speaks JSONL over standard input and output; see the
//! [`transport`] module.

mod backend;
mod bootstrap;
mod dispatch;
mod health;
mod projection;
mod registry;
mod shutdown;
mod telemetry;
pub mod tools;
pub mod transport;

pub use backend::{AtlassianBackend, CommandFault, OfflineBackend};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
    bootstrap_with_commands,
};
pub use dispatch::{
    CancelHandle, Cancellation, CommandContext, CommandHandler, DispatchRequest, Dispatcher,
    InvocationError, InvocationState, Subject, cancellation_pair,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use projection::project;
pub use registry::{
    CommandRegistration, CommandRegistry, ParamKind, ParamSpec, RegistryBuilder, RegistryError,
    SubjectPolicy,
};
pub use shutdown::{ShutdownError, ShutdownListener};
pub use telemetry::{
    CallerEvent, CallerLog, DiagnosticLayer, InitMode, Installation, LogSettings, LoggingRouter,
    ProgressSink, Redactor, SinkOptions, SinkTarget, TRACE_PREFIX, TelemetryError,
};

#[cfg(test)]
mod tests;
