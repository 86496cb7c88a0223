use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ordered log severity shared by both logging channels.
///
/// `Trace` sits strictly below `Debug` and carries high-volume detail.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    /// Finer than debug.
    Trace,
    /// Developer detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that did not stop the operation.
    #[strum(to_string = "warning", serialize = "warn")]
    Warning,
    /// An operation failed. `critical` parses to this level.
    #[strum(to_string = "error", serialize = "critical")]
    Error,
}

impl LogLevel {
    /// Every level from least to most severe.
    pub const ALL: [Self; 5] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
    ];

    /// Returns `true` when an event at `self` passes a `threshold`.
    #[must_use]
    pub fn admits(self, threshold: Self) -> bool {
        self >= threshold
    }

    /// Position in [`LogLevel::ALL`], suitable for atomic storage.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Trace => 0,
            Self::Debug => 1,
            Self::Info => 2,
            Self::Warning => 3,
            Self::Error => 4,
        }
    }

    /// Inverse of [`LogLevel::rank`]; out-of-range ranks clamp to `Error`.
    #[must_use]
    pub const fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warning,
            _ => Self::Error,
        }
    }
}

/// Errors encountered while parsing a [`LogLevel`] from text.
pub type LogLevelParseError = strum::ParseError;

/// Supported rendering formats for process-diagnostic output.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Text,
    /// One self-contained JSON record per event in file sinks.
    Json,
}

impl LogFormat {
    /// Returns `true` when file sinks should emit structured records.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
