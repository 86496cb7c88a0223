//! Subject and parameter normalisation against a registration.

use serde_json::{Map, Value};

use atlassian_mcp_types::Field;

use crate::registry::{CommandRegistration, SubjectPolicy};

use super::errors::InvocationError;
use super::handler::Subject;

/// Applies the command's subject policy.
///
/// An empty or whitespace-only subject is always rejected: absence is the
/// only way to ask for a command's default.
pub(crate) fn subject(
    registration: &CommandRegistration,
    field: &Field<String>,
) -> Result<Subject, InvocationError> {
    match (registration.subject_policy(), field) {
        (_, Field::Empty) => Err(InvocationError::EmptySubject),
        (_, Field::Present(text)) if text.trim().is_empty() => Err(InvocationError::EmptySubject),
        (_, Field::Present(text)) => Ok(Subject::Named(text.trim().to_owned())),
        (SubjectPolicy::Required, Field::Absent) => Err(InvocationError::MissingSubject {
            command: registration.name().to_owned(),
        }),
        (SubjectPolicy::ActingUser, Field::Absent) => Ok(Subject::ActingUser),
        (SubjectPolicy::Optional, Field::Absent) => Ok(Subject::Unspecified),
    }
}

/// Checks supplied parameters and fills in defaults.
///
/// A parameter sent as `null` counts as omitted.
pub(crate) fn parameters(
    registration: &CommandRegistration,
    field: &Field<Map<String, Value>>,
) -> Result<Map<String, Value>, InvocationError> {
    let mut normalized = Map::new();
    if let Some(supplied) = field.present() {
        for (name, value) in supplied {
            let spec =
                registration
                    .param_spec(name)
                    .ok_or_else(|| InvocationError::UnknownParameter {
                        name: name.clone(),
                    })?;
            if value.is_null() {
                continue;
            }
            let value = spec
                .normalize(value)
                .map_err(|reason| InvocationError::InvalidParameter {
                    name: name.clone(),
                    reason,
                })?;
            normalized.insert(name.clone(), value);
        }
    }
    for spec in registration.params() {
        if normalized.contains_key(spec.name()) {
            continue;
        }
        if let Some(default) = spec.default_value() {
            normalized.insert(spec.name().to_owned(), default.clone());
        } else if spec.is_required() {
            return Err(InvocationError::MissingParameter {
                name: spec.name().to_owned(),
            });
        }
    }
    Ok(normalized)
}
