//! Per-invocation failures and their mapping onto the error taxonomy.

use std::time::Duration;

use thiserror::Error;

use atlassian_mcp_types::{CauseRecord, ErrorType, ToolResult};

use crate::backend::CommandFault;

/// Why an invocation failed.
///
/// Every variant maps onto exactly one [`ErrorType`]; the dispatcher turns
/// each into a failed [`ToolResult`] and never lets it escape as a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// The request itself could not be understood.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Parser or schema diagnostic.
        message: String,
    },
    /// No command is registered under the requested name.
    #[error("unknown command '{command}'")]
    UnknownCommand {
        /// Requested name.
        command: String,
    },
    /// The product value is not one of the known products.
    #[error("unknown product '{value}'")]
    UnknownProduct {
        /// Rejected value.
        value: String,
    },
    /// The command does not accept the requested product.
    #[error("command '{command}' does not accept product '{product}' (accepts: {accepted})")]
    ProductNotAccepted {
        /// Resolved command.
        command: String,
        /// Requested product.
        product: String,
        /// Comma-separated accepted products.
        accepted: String,
    },
    /// A required subject was omitted.
    #[error("command '{command}' requires a subject")]
    MissingSubject {
        /// Resolved command.
        command: String,
    },
    /// The subject was supplied but empty.
    #[error("subject must not be empty")]
    EmptySubject,
    /// A parameter is not declared by the command.
    #[error("unknown parameter '{name}'")]
    UnknownParameter {
        /// Rejected parameter name.
        name: String,
    },
    /// A parameter value has the wrong shape or range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Validation diagnostic.
        reason: String,
    },
    /// A required parameter was omitted.
    #[error("missing required parameter '{name}'")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },
    /// The command needs an instance URL and none is usable.
    #[error("Atlassian instance is not configured: {reason}")]
    NotConfigured {
        /// Why the configured URL is unusable.
        reason: String,
    },
    /// The handler reported a categorised fault.
    #[error(transparent)]
    Fault(#[from] CommandFault),
    /// The handler panicked.
    #[error("command handler panicked: {message}")]
    Panicked {
        /// Panic payload text.
        message: String,
    },
    /// The handler did not finish in time.
    #[error("command timed out after {}s", .timeout.as_secs())]
    TimedOut {
        /// Configured limit.
        timeout: Duration,
    },
    /// The caller or the server cancelled the invocation.
    #[error("invocation cancelled")]
    Cancelled,
}

impl InvocationError {
    /// Creates a malformed-request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates an unknown-command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an unknown-product error.
    pub fn unknown_product(value: impl Into<String>) -> Self {
        Self::UnknownProduct {
            value: value.into(),
        }
    }

    /// Taxonomy category.
    #[must_use]
    pub const fn error_type(&self) -> ErrorType {
        match self {
            Self::UnknownCommand { .. } => ErrorType::NotFound,
            Self::UnknownProduct { .. } | Self::ProductNotAccepted { .. } => {
                ErrorType::InvalidProduct
            }
            Self::MalformedRequest { .. }
            | Self::MissingSubject { .. }
            | Self::EmptySubject
            | Self::UnknownParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::MissingParameter { .. } => ErrorType::ValidationError,
            Self::NotConfigured { .. } => ErrorType::ConfigError,
            Self::Fault(fault) => fault.error_type(),
            Self::Panicked { .. } => ErrorType::Unknown,
            Self::TimedOut { .. } => ErrorType::NetworkError,
            Self::Cancelled => ErrorType::Cancelled,
        }
    }

    /// Descriptive record of the underlying fault, for failures that have
    /// one.
    #[must_use]
    pub fn cause(&self) -> Option<CauseRecord> {
        match self {
            Self::Fault(fault) => Some(fault.cause_record()),
            Self::Panicked { message } => Some(CauseRecord::new("panic", message.clone())),
            Self::TimedOut { .. } => Some(CauseRecord::new("Elapsed", "deadline has elapsed")),
            _ => None,
        }
    }

    /// Converts the error into a failed result.
    #[must_use]
    pub fn into_result<T>(self) -> ToolResult<T> {
        let error_type = self.error_type();
        match self.cause() {
            Some(cause) => ToolResult::failure_caused(self.to_string(), error_type, cause),
            None => ToolResult::failure(self.to_string(), error_type),
        }
    }
}
