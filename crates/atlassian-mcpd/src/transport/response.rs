//! Server message serialization and the single stdout writer.

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use atlassian_config::LogLevel;
use atlassian_mcp_types::ToolResult;

use crate::telemetry::{CallerEvent, ProgressSink};

use super::TRANSPORT_TARGET;
use super::errors::DispatchError;

/// Messages written to standard output, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Caller-visible log line for one invocation.
    Log {
        /// Invocation identifier.
        id: Value,
        /// Wire severity.
        level: LogLevel,
        /// Message text.
        message: String,
        /// Structured attributes.
        #[serde(skip_serializing_if = "Map::is_empty")]
        attributes: Map<String, Value>,
    },
    /// Progress of one invocation.
    Progress {
        /// Invocation identifier.
        id: Value,
        /// Units completed.
        progress: u64,
        /// Total units, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
        /// Status text.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Terminal result of one invocation.
    Result {
        /// Invocation identifier; `null` when the request was unreadable.
        id: Value,
        /// Outcome, serialized with `success` first.
        result: ToolResult<Value>,
    },
}

impl ServerMessage {
    /// Wraps a caller event for invocation `id`.
    #[must_use]
    pub fn from_event(id: Value, event: CallerEvent) -> Self {
        match event {
            CallerEvent::Log {
                level,
                message,
                attributes,
            } => Self::Log {
                id,
                level,
                message,
                attributes,
            },
            CallerEvent::Progress {
                progress,
                total,
                message,
            } => Self::Progress {
                id,
                progress,
                total,
                message,
            },
        }
    }

    /// Serializes the message as one newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SerializeResponse`] when serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, DispatchError> {
        let mut line = serde_json::to_vec(self).map_err(DispatchError::SerializeResponse)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Progress sink forwarding one invocation's events to the writer.
///
/// Caller events are best effort: when the outbound queue is full the event
/// is dropped rather than blocking the handler. Results never take this path.
#[derive(Debug)]
pub struct ChannelSink {
    id: Value,
    sender: mpsc::Sender<ServerMessage>,
}

impl ChannelSink {
    /// Creates a sink tagging events with `id`.
    #[must_use]
    pub const fn new(id: Value, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, sender }
    }
}

impl ProgressSink for ChannelSink {
    fn deliver(&self, event: CallerEvent) {
        let message = ServerMessage::from_event(self.id.clone(), event);
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!(target: TRANSPORT_TARGET, "outbound queue full; caller event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!(target: TRANSPORT_TARGET, "writer gone; caller event dropped");
            }
        }
    }
}

/// Writes queued messages until every sender is dropped.
///
/// Each line is flushed as soon as it is written so callers see progress
/// while long commands run.
///
/// # Errors
///
/// Returns the first write or serialization failure.
pub async fn write_messages<W>(
    mut output: W,
    mut messages: mpsc::Receiver<ServerMessage>,
) -> Result<(), DispatchError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = messages.recv().await {
        let line = message.encode()?;
        output.write_all(&line).await?;
        output.flush().await?;
    }
    output.shutdown().await?;
    Ok(())
}
