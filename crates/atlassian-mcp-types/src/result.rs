//! Canonical outcome of a dispatched command.
//!
//! A [`ToolResult`] is created once per invocation and serialized exactly once
//! at the transport boundary. It is plain data: a failure remembers what
//! caused it as a [`CauseRecord`] (type name and message), never as a live
//! error object.

use std::error::Error as StdError;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error_type::ErrorType;

/// Descriptive record of the fault that caused a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseRecord {
    type_name: String,
    message: String,
}

impl CauseRecord {
    /// Builds a record from explicit parts.
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Captures the short type name and display text of an error.
    #[must_use]
    pub fn capture<E>(error: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }

    /// Type name of the original fault.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Message of the original fault.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for CauseRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.type_name, self.message)
    }
}

/// Strips module paths and generic arguments from a type name.
fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Failure half of a [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    error: String,
    error_type: ErrorType,
    cause: Option<CauseRecord>,
}

impl Failure {
    /// Creates a failure without a recorded cause.
    #[must_use]
    pub fn new(error: impl Into<String>, error_type: ErrorType) -> Self {
        Self {
            error: error.into(),
            error_type,
            cause: None,
        }
    }

    /// Attaches the original cause.
    #[must_use]
    pub fn with_cause(mut self, cause: CauseRecord) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Human-readable message.
    #[must_use]
    pub fn error(&self) -> &str {
        self.error.as_str()
    }

    /// Machine-readable category.
    #[must_use]
    pub const fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Original cause, when one was captured.
    #[must_use]
    pub const fn cause(&self) -> Option<&CauseRecord> {
        self.cause.as_ref()
    }
}

/// Success-or-failure outcome of one command invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult<T> {
    /// The command succeeded with a value.
    Ok(T),
    /// The command failed.
    Failure(Failure),
}

impl<T> ToolResult<T> {
    /// Creates a successful result.
    #[must_use]
    pub const fn ok(value: T) -> Self {
        Self::Ok(value)
    }

    /// Creates a failed result without a recorded cause.
    #[must_use]
    pub fn failure(error: impl Into<String>, error_type: ErrorType) -> Self {
        Self::Failure(Failure::new(error, error_type))
    }

    /// Creates a failed result that remembers its cause.
    #[must_use]
    pub fn failure_caused(
        error: impl Into<String>,
        error_type: ErrorType,
        cause: CauseRecord,
    ) -> Self {
        Self::Failure(Failure::new(error, error_type).with_cause(cause))
    }

    /// Creates a failed result, capturing the cause's type name and message.
    #[must_use]
    pub fn failure_with_cause<E>(error: impl Into<String>, error_type: ErrorType, cause: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self::failure_caused(error, error_type, CauseRecord::capture(cause))
    }

    /// Returns `true` for a successful result.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns `true` for a failed result.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrows the value of a successful result.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrows the failure of a failed result.
    #[must_use]
    pub const fn failure_ref(&self) -> Option<&Failure> {
        match self {
            Self::Ok(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Returns the failure category, if any.
    #[must_use]
    pub fn error_type(&self) -> Option<ErrorType> {
        self.failure_ref().map(Failure::error_type)
    }

    /// Consumes the result, returning the value of a success.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Returns the value, or `default` for a failure.
    #[must_use]
    pub fn unwrap_or(self, default: T) -> T {
        self.into_value().unwrap_or(default)
    }

    /// Maps the success value.
    #[must_use]
    pub fn map<U, F>(self, op: F) -> ToolResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Ok(value) => ToolResult::Ok(op(value)),
            Self::Failure(failure) => ToolResult::Failure(failure),
        }
    }
}

impl<T> From<Failure> for ToolResult<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl ToolResult<Value> {
    /// Renders the wire object as a JSON value.
    ///
    /// Successes render as `{success, value}`; failures as `{success, error,
    /// error_type}` plus `cause_type`/`cause_message` when a cause was
    /// captured. The key set depends only on the result's contents. Key order
    /// is only fixed when the result is serialized directly.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut object = Map::new();
        match self {
            Self::Ok(value) => {
                object.insert("success".to_owned(), Value::Bool(true));
                object.insert("value".to_owned(), value.clone());
            }
            Self::Failure(failure) => {
                object.insert("success".to_owned(), Value::Bool(false));
                object.insert("error".to_owned(), Value::String(failure.error.clone()));
                object.insert(
                    "error_type".to_owned(),
                    Value::String(failure.error_type.as_str().to_owned()),
                );
                if let Some(cause) = &failure.cause {
                    object.insert(
                        "cause_type".to_owned(),
                        Value::String(cause.type_name.clone()),
                    );
                    object.insert(
                        "cause_message".to_owned(),
                        Value::String(cause.message.clone()),
                    );
                }
            }
        }
        Value::Object(object)
    }
}

#[derive(Serialize)]
struct WireOut<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause_message: Option<&'a str>,
}

impl<T> Serialize for ToolResult<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Ok(value) => WireOut {
                success: true,
                value: Some(value),
                error: None,
                error_type: None,
                cause_type: None,
                cause_message: None,
            },
            Self::Failure(failure) => WireOut {
                success: false,
                value: None,
                error: Some(failure.error.as_str()),
                error_type: Some(failure.error_type),
                cause_type: failure.cause.as_ref().map(CauseRecord::type_name),
                cause_message: failure.cause.as_ref().map(CauseRecord::message),
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct WireIn<T> {
    success: bool,
    #[serde(default = "Option::default", deserialize_with = "present_value")]
    value: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_type: Option<ErrorType>,
    #[serde(default)]
    cause_type: Option<String>,
    #[serde(default)]
    cause_message: Option<String>,
}

/// Keeps an explicit `null` value as `Some` so `ok(null)` survives a round
/// trip.
fn present_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl<'de, T> Deserialize<'de> for ToolResult<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireIn::<T>::deserialize(deserializer)?;
        match (wire.success, wire.value, wire.error, wire.error_type) {
            (true, Some(value), None, None) => Ok(Self::Ok(value)),
            (false, None, Some(error), Some(error_type)) => {
                let failure = Failure::new(error, error_type);
                let failure = match (wire.cause_type, wire.cause_message) {
                    (None, None) => failure,
                    (type_name, message) => failure.with_cause(CauseRecord::new(
                        type_name.unwrap_or_default(),
                        message.unwrap_or_default(),
                    )),
                };
                Ok(Self::Failure(failure))
            }
            (true, _, _, _) => Err(de::Error::custom(
                "successful result must carry a value and no error",
            )),
            (false, _, _, _) => Err(de::Error::custom(
                "failed result must carry error and error_type and no value",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_renders_success_and_value_only() {
        let wire = ToolResult::ok(json!({"id": "1"})).to_wire();
        assert_eq!(wire, json!({"success": true, "value": {"id": "1"}}));
    }

    #[test]
    fn failure_without_cause_omits_cause_keys() {
        let wire = ToolResult::<Value>::failure("denied", ErrorType::AuthError).to_wire();
        assert_eq!(
            wire,
            json!({"success": false, "error": "denied", "error_type": "auth_error"})
        );
    }

    #[test]
    fn captured_cause_keeps_only_descriptive_data() {
        let source = io::Error::new(io::ErrorKind::TimedOut, "socket timed out");
        let result =
            ToolResult::<Value>::failure_with_cause("backend down", ErrorType::NetworkError, &source);
        let wire = result.to_wire();
        assert_eq!(wire["cause_type"], json!("Error"));
        assert_eq!(wire["cause_message"], json!("socket timed out"));
    }

    #[test]
    fn serialize_matches_to_wire() {
        let result = ToolResult::<Value>::failure_caused(
            "boom",
            ErrorType::Unknown,
            CauseRecord::new("Panic", "index out of bounds"),
        );
        assert_eq!(serde_json::to_value(&result).unwrap(), result.to_wire());
    }

    #[test]
    fn serialized_keys_lead_with_success() {
        let failure = ToolResult::<Value>::failure_caused(
            "boom",
            ErrorType::Unknown,
            CauseRecord::new("Panic", "index out of bounds"),
        );
        assert_eq!(
            serde_json::to_string(&failure).unwrap(),
            concat!(
                r#"{"success":false,"error":"boom","error_type":"unknown","#,
                r#""cause_type":"Panic","cause_message":"index out of bounds"}"#
            )
        );
        assert_eq!(
            serde_json::to_string(&ToolResult::ok(json!(1))).unwrap(),
            r#"{"success":true,"value":1}"#
        );
    }

    #[test]
    fn ok_round_trips_through_json() {
        let text = serde_json::to_string(&ToolResult::ok(json!([1, 2]))).unwrap();
        let back: ToolResult<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.value(), Some(&json!([1, 2])));
    }

    #[test]
    fn ok_null_round_trips() {
        let text = serde_json::to_string(&ToolResult::ok(Value::Null)).unwrap();
        let back: ToolResult<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ToolResult::ok(Value::Null));
    }

    #[test]
    fn auth_failure_round_trips() {
        let text =
            serde_json::to_string(&ToolResult::<Value>::failure("bad token", ErrorType::AuthError))
                .unwrap();
        let back: ToolResult<Value> = serde_json::from_str(&text).unwrap();
        assert!(back.is_failure());
        assert_eq!(back.error_type(), Some(ErrorType::AuthError));
    }

    #[rstest]
    #[case::both(json!({"success": true, "value": 1, "error": "x", "error_type": "unknown"}))]
    #[case::neither(json!({"success": false}))]
    #[case::success_without_value(json!({"success": true}))]
    fn rejects_inconsistent_wire_objects(#[case] input: Value) {
        assert!(serde_json::from_value::<ToolResult<Value>>(input).is_err());
    }

    #[test]
    fn short_type_name_drops_paths_and_generics() {
        assert_eq!(short_type_name("std::io::error::Error"), "Error");
        assert_eq!(short_type_name("alloc::vec::Vec<u8>"), "Vec");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn unwrap_or_falls_back_on_failure() {
        let failed = ToolResult::<i32>::failure("nope", ErrorType::NotFound);
        assert_eq!(failed.unwrap_or(7), 7);
        assert_eq!(ToolResult::ok(3).unwrap_or(7), 3);
    }
}
