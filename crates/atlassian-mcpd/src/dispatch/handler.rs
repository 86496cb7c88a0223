//! Handler seam and the normalised inputs handed to it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use atlassian_config::{InstanceUrl, InstanceUrlError};
use atlassian_mcp_types::Product;

use crate::backend::{AtlassianBackend, CommandFault};
use crate::telemetry::CallerLog;

/// Typed implementation of one command.
///
/// Handlers own no state between calls. They return a raw success payload or
/// a categorised [`CommandFault`]; wrapping the outcome into a result is the
/// dispatcher's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command.
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault>;
}

/// Subject after the command's policy has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A caller-supplied identifier, trimmed.
    Named(String),
    /// The caller omitted the subject and the command reads that as the
    /// acting user.
    ActingUser,
    /// The caller omitted an optional subject.
    Unspecified,
}

impl Subject {
    /// Identifier text, when one was supplied.
    #[must_use]
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(text) => Some(text.as_str()),
            Self::ActingUser | Self::Unspecified => None,
        }
    }
}

/// Validated, defaulted inputs for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    pub(crate) command: String,
    pub(crate) product: Product,
    pub(crate) subject: Subject,
    pub(crate) parameters: Map<String, Value>,
    pub(crate) caller: CallerLog,
    pub(crate) backend: Arc<dyn AtlassianBackend>,
    pub(crate) instance: Result<InstanceUrl, InstanceUrlError>,
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandContext")
            .field("command", &self.command)
            .field("product", &self.product)
            .field("subject", &self.subject)
            .field("parameters", &self.parameters)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl CommandContext {
    /// Name of the invoked command.
    #[must_use]
    pub fn command(&self) -> &str {
        self.command.as_str()
    }

    /// Target product.
    #[must_use]
    pub const fn product(&self) -> Product {
        self.product
    }

    /// Subject after policy defaults.
    #[must_use]
    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Returns the named subject or an input fault.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault::InvalidInput`] when no subject was supplied.
    pub fn require_subject(&self) -> Result<&str, CommandFault> {
        self.subject
            .as_named()
            .ok_or_else(|| CommandFault::invalid_input(format!("{} needs a subject", self.command)))
    }

    /// Validated parameters with defaults filled in.
    #[must_use]
    pub const fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// String parameter, when present.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    /// Integer parameter, when present.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.parameters.get(name).and_then(Value::as_i64)
    }

    /// Caller-visible log for this invocation.
    #[must_use]
    pub const fn caller(&self) -> &CallerLog {
        &self.caller
    }

    /// Backend collaborator.
    #[must_use]
    pub fn backend(&self) -> &dyn AtlassianBackend {
        self.backend.as_ref()
    }

    /// Configured instance, or why it is unusable.
    #[must_use]
    pub const fn instance(&self) -> &Result<InstanceUrl, InstanceUrlError> {
        &self.instance
    }
}
