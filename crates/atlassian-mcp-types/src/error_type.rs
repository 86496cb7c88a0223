use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Machine-readable failure category carried by every failed
/// [`ToolResult`](crate::ToolResult).
///
/// The serialized tags are a stable contract: callers branch on them to
/// decide whether to retry, fix their input, or give up.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorType {
    /// Unknown command or unknown target entity.
    NotFound,
    /// The command does not accept the requested product.
    InvalidProduct,
    /// Malformed subject or parameters.
    ValidationError,
    /// Credential or permission failure.
    AuthError,
    /// Backend unreachable or timed out.
    NetworkError,
    /// Server configuration is missing or invalid.
    ConfigError,
    /// The invocation was cancelled before it completed.
    Cancelled,
    /// Uncategorised failure.
    Unknown,
}

impl ErrorType {
    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` when retrying the same invocation may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkError | Self::Cancelled)
    }
}
