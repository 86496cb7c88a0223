//! Client message deserialization.
//!
//! Each line on standard input is one message tagged by `kind`:
//!
//! ```text
//! {"kind":"invoke","id":1,"command":"atl_get_issue","product":"jira","subject":"PRJ-1"}
//! {"kind":"cancel","id":1}
//! ```

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use atlassian_config::LogLevel;
use atlassian_mcp_types::{CommandEnvelope, Field, Product};

use crate::dispatch::{DispatchRequest, InvocationError};
use crate::registry::CommandRegistry;

use super::errors::DispatchError;

/// Parsed client message.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts an invocation.
    Invoke(InvokeRequest),
    /// Cancels the in-flight invocation with the same id.
    Cancel {
        /// Identifier of the invocation to cancel.
        id: Value,
    },
}

/// Invocation as sent by the client. Envelope members are flattened into the
/// message.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// Client-chosen identifier echoed on every related server message.
    pub id: Value,
    /// Prefixed command name.
    pub command: String,
    /// Product name; validated after parsing so unknown values map onto
    /// `invalid_product`.
    #[serde(default)]
    pub product: Option<String>,
    /// Primary target identifier.
    #[serde(default)]
    pub subject: Field<String>,
    /// Command parameters.
    #[serde(default)]
    pub parameters: Field<Map<String, Value>>,
    /// Field paths to keep in the response.
    #[serde(default)]
    pub response_fields: Field<Vec<String>>,
    /// Caller-visible verbosity for this invocation.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Invocation the transport could not turn into a [`DispatchRequest`].
#[derive(Debug)]
pub struct RejectedInvoke {
    /// Echoed identifier.
    pub id: Value,
    /// Command name as sent.
    pub command: String,
    /// Why the invocation was rejected.
    pub error: InvocationError,
}

impl ClientMessage {
    /// Parses one JSONL line. Trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedJsonl`] for blank lines and invalid
    /// JSON, and [`DispatchError::InvalidStructure`] for JSON that is not a
    /// client message.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        let value: Value = serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)?;
        serde_json::from_value(value)
            .map_err(|error| DispatchError::invalid_structure(error.to_string()))
    }
}

/// Best-effort `id` of a line that failed to parse; `null` when none.
#[must_use]
pub fn recover_id(line: &[u8]) -> Value {
    serde_json::from_slice::<Value>(line.trim_ascii())
        .ok()
        .and_then(|value| value.get("id").cloned())
        .unwrap_or(Value::Null)
}

impl InvokeRequest {
    /// Splits the message into its id and a dispatchable request.
    ///
    /// Commands are resolved against `registry` before the product is
    /// checked, so an unregistered command is reported as not found whatever
    /// product it names.
    ///
    /// # Errors
    ///
    /// Returns a [`RejectedInvoke`] when the product or log level is not
    /// recognised; its error is an unknown command when the command is not
    /// registered either.
    pub fn into_dispatch(
        self,
        registry: &CommandRegistry,
    ) -> Result<(Value, DispatchRequest), Box<RejectedInvoke>> {
        let Self {
            id,
            command,
            product,
            subject,
            parameters,
            response_fields,
            log_level,
        } = self;
        let reject = |error| {
            let error = if registry.resolve(&command).is_some() {
                error
            } else {
                InvocationError::unknown_command(command.as_str())
            };
            Box::new(RejectedInvoke {
                id: id.clone(),
                command: command.clone(),
                error,
            })
        };

        let product = match product.as_deref().map(str::trim) {
            None | Some("") => Product::default(),
            Some(name) => Product::from_str(name)
                .map_err(|_| reject(InvocationError::unknown_product(name)))?,
        };
        let log_level = log_level
            .as_deref()
            .map(|level| {
                LogLevel::from_str(level.trim()).map_err(|_| {
                    reject(InvocationError::malformed(format!(
                        "unknown log level '{level}'"
                    )))
                })
            })
            .transpose()?;

        let envelope = CommandEnvelope {
            product,
            subject,
            parameters,
            response_fields,
        };
        let mut request = DispatchRequest::new(command, envelope);
        request.log_level = log_level;
        Ok((id, request))
    }
}
