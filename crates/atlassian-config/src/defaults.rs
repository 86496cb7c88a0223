use crate::logging::{LogFormat, LogLevel};

/// Prefix prepended to every tool name unless overridden.
pub const DEFAULT_TOOL_PREFIX: &str = "atl";

/// Default backend read timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default verbosity for both logging channels.
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Default diagnostic format for the server.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Text
}
