//! Categorised faults raised by command handlers and backend clients.

use std::time::Duration;

use thiserror::Error;

use atlassian_mcp_types::{CauseRecord, ErrorType};

/// Domain failure reported by a handler or the backend collaborator.
///
/// Handlers return these instead of building results; the dispatcher maps
/// each variant onto the stable [`ErrorType`] taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandFault {
    /// The target entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity, for example `issue`.
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },
    /// Credentials were missing or rejected.
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    /// Credentials were valid but lack permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// The backend did not answer in time.
    #[error("backend timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    /// The backend rejected the request as malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Server configuration prevents the call.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl CommandFault {
    /// Builds a [`CommandFault::NotFound`].
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Builds a [`CommandFault::Unreachable`].
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    /// Builds a [`CommandFault::InvalidInput`].
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Taxonomy category for this fault.
    #[must_use]
    pub const fn error_type(&self) -> ErrorType {
        match self {
            Self::NotFound { .. } => ErrorType::NotFound,
            Self::Unauthorized(_) | Self::PermissionDenied(_) => ErrorType::AuthError,
            Self::Unreachable(_) | Self::TimedOut(_) => ErrorType::NetworkError,
            Self::InvalidInput(_) => ErrorType::ValidationError,
            Self::Configuration(_) => ErrorType::ConfigError,
            Self::Other(_) => ErrorType::Unknown,
        }
    }

    /// Variant name used as the recorded cause type.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::Unauthorized(_) => "Unauthorized",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::Unreachable(_) => "Unreachable",
            Self::TimedOut(_) => "TimedOut",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Configuration(_) => "Configuration",
            Self::Other(_) => "Other",
        }
    }

    /// Descriptive record of this fault.
    #[must_use]
    pub fn cause_record(&self) -> CauseRecord {
        CauseRecord::new(format!("CommandFault::{}", self.kind_name()), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(CommandFault::not_found("issue", "PRJ-1"), ErrorType::NotFound)]
    #[case(CommandFault::Unauthorized("bad token".into()), ErrorType::AuthError)]
    #[case(CommandFault::PermissionDenied("no access".into()), ErrorType::AuthError)]
    #[case(CommandFault::unreachable("dns"), ErrorType::NetworkError)]
    #[case(CommandFault::TimedOut(Duration::from_secs(30)), ErrorType::NetworkError)]
    #[case(CommandFault::invalid_input("bad jql"), ErrorType::ValidationError)]
    #[case(CommandFault::Configuration("no url".into()), ErrorType::ConfigError)]
    #[case(CommandFault::Other("boom".into()), ErrorType::Unknown)]
    fn maps_onto_taxonomy(#[case] fault: CommandFault, #[case] expected: ErrorType) {
        assert_eq!(fault.error_type(), expected);
    }

    #[test]
    fn cause_record_names_the_variant() {
        let record = CommandFault::not_found("issue", "PRJ-1").cause_record();
        assert_eq!(record.type_name(), "CommandFault::NotFound");
        assert_eq!(record.message(), "issue 'PRJ-1' not found");
    }
}
