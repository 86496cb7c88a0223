//! Runtime configuration for the Atlassian command server.
//!
//! Values resolve from command-line flags first, then environment variables,
//! then built-in defaults. The instance URL is deliberately optional at load
//! time: a server without one still starts, answers `health_check`, and
//! explains how to finish setup instead of refusing to run.

mod defaults;
mod instance;
mod logging;

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS, DEFAULT_TOOL_PREFIX, default_log_format,
};
pub use instance::{InstanceUrl, InstanceUrlError, SETUP_GUIDANCE};
pub use logging::{LogFormat, LogFormatParseError, LogLevel, LogLevelParseError};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input could not be parsed.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
    /// The tool prefix contains characters tools may not use.
    #[error("invalid tool prefix '{prefix}': use ASCII letters, digits, '-' or '_'")]
    InvalidToolPrefix {
        /// Rejected prefix.
        prefix: String,
    },
}

impl ConfigError {
    /// Prints the error in clap's format and exits the process.
    ///
    /// Help and version requests exit with status 0, everything else with
    /// clap's usage status.
    pub fn exit(self) -> ! {
        match self {
            Self::Arguments(error) => error.exit(),
            other @ Self::InvalidToolPrefix { .. } => {
                clap::Error::raw(clap::error::ErrorKind::ValueValidation, format!("{other}\n"))
                    .exit()
            }
        }
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "mcp-server-atlassian",
    about = "Serve Atlassian tools over a JSON lines protocol on stdio",
    version
)]
pub struct Config {
    /// Base URL of the Atlassian instance.
    #[arg(long = "atlassian-url", env = "ATLASSIAN_URL")]
    pub atlassian_url: Option<String>,
    /// Prefix prepended to every tool name.
    #[arg(long = "tool-prefix", env = "MCP_TOOL_PREFIX", default_value = DEFAULT_TOOL_PREFIX)]
    pub tool_prefix: String,
    /// Minimum severity written by both logging channels.
    #[arg(long = "log-level", env = "ATLASSIAN_MCP_LOG_LEVEL", default_value_t = DEFAULT_LOG_LEVEL)]
    pub log_level: LogLevel,
    /// Optional file receiving process-diagnostic output.
    #[arg(long = "log-file", env = "ATLASSIAN_MCP_LOG_FILE")]
    pub log_file: Option<Utf8PathBuf>,
    /// Rendering of file sink records.
    #[arg(long = "log-format", env = "ATLASSIAN_MCP_LOG_FORMAT", default_value_t = default_log_format())]
    pub log_format: LogFormat,
    /// Masks sensitive substrings before events reach any sink.
    #[arg(
        long = "redact-logs",
        env = "ATLASSIAN_MCP_REDACT",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = FalseyValueParser::new()
    )]
    pub redact_logs: bool,
    /// Handler timeout in seconds.
    #[arg(
        long = "timeout",
        env = "ATLASSIAN_MCP_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            atlassian_url: None,
            tool_prefix: DEFAULT_TOOL_PREFIX.to_owned(),
            log_level: DEFAULT_LOG_LEVEL,
            log_file: None,
            log_format: default_log_format(),
            redact_logs: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.tool_prefix.as_str();
        let valid = !prefix.is_empty()
            && prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidToolPrefix {
                prefix: self.tool_prefix.clone(),
            })
        }
    }

    /// Validates the configured instance URL.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceUrlError`] when the URL is missing or invalid.
    pub fn instance(&self) -> Result<InstanceUrl, InstanceUrlError> {
        match self.atlassian_url.as_deref() {
            Some(raw) => InstanceUrl::parse(raw),
            None => Err(InstanceUrlError::Missing),
        }
    }

    /// Prefix prepended to tool names.
    #[must_use]
    pub fn tool_prefix(&self) -> &str {
        self.tool_prefix.as_str()
    }

    /// Prefixed tool name, for example `atl_health_check`.
    #[must_use]
    pub fn tool_name(&self, name: &str) -> String {
        format!("{}_{name}", self.tool_prefix)
    }

    /// Minimum log severity.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Optional diagnostic log file.
    #[must_use]
    pub fn log_file(&self) -> Option<&Utf8PathBuf> {
        self.log_file.as_ref()
    }

    /// Diagnostic file rendering.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether sensitive substrings are masked.
    #[must_use]
    pub const fn redact_logs(&self) -> bool {
        self.redact_logs
    }

    /// Handler timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
