//! Masking of sensitive substrings in log output.
//!
//! The stage is optional: without the `redaction` feature, or when a pattern
//! fails to compile, [`Redactor::load`] yields `None` and events reach their
//! sinks untouched.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

use super::TELEMETRY_TARGET;

/// Reasons the redaction stage cannot be used.
#[derive(Debug, Error)]
enum RedactionUnavailable {
    /// The crate was built without the `redaction` feature.
    #[cfg(not(feature = "redaction"))]
    #[error("built without the redaction feature")]
    Disabled,
    /// A mask pattern failed to compile.
    #[cfg(feature = "redaction")]
    #[error("mask pattern {name} failed to compile: {message}")]
    Pattern { name: &'static str, message: String },
}

/// Mask rules in application order.
#[cfg(feature = "redaction")]
const RULES: [(&str, &str, &str); 4] = [
    (
        "email",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "[EMAIL]",
    ),
    ("phone", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "[PHONE]"),
    (
        "card",
        r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
        "[CARD]",
    ),
    ("api_key", r"\b[A-Za-z0-9]{32,}\b", "[API_KEY]"),
];

#[cfg(feature = "redaction")]
#[derive(Debug)]
struct Rule {
    pattern: regex::Regex,
    mask: &'static str,
}

/// Compiled mask rules.
#[derive(Debug)]
pub struct Redactor {
    #[cfg(feature = "redaction")]
    rules: Vec<Rule>,
}

impl Redactor {
    /// Builds the stage, or `None` when it is unavailable.
    #[must_use]
    pub fn load() -> Option<Self> {
        match Self::compile() {
            Ok(redactor) => Some(redactor),
            Err(reason) => {
                tracing::warn!(
                    target: TELEMETRY_TARGET,
                    reason = %reason,
                    "log redaction unavailable; events pass through unchanged"
                );
                None
            }
        }
    }

    #[cfg(feature = "redaction")]
    fn compile() -> Result<Self, RedactionUnavailable> {
        let mut rules = Vec::with_capacity(RULES.len());
        for (name, pattern, mask) in RULES {
            let pattern = regex::Regex::new(pattern).map_err(|error| {
                RedactionUnavailable::Pattern {
                    name,
                    message: error.to_string(),
                }
            })?;
            rules.push(Rule { pattern, mask });
        }
        Ok(Self { rules })
    }

    #[cfg(not(feature = "redaction"))]
    fn compile() -> Result<Self, RedactionUnavailable> {
        Err(RedactionUnavailable::Disabled)
    }

    /// Masks every sensitive substring in `text`.
    ///
    /// Text without matches is returned borrowed, byte for byte.
    #[cfg(feature = "redaction")]
    #[must_use]
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        for rule in &self.rules {
            let replaced = match rule.pattern.replace_all(&current, rule.mask) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            if let Some(replaced) = replaced {
                current = Cow::Owned(replaced);
            }
        }
        current
    }

    /// Masks every sensitive substring in `text`.
    #[cfg(not(feature = "redaction"))]
    #[must_use]
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }

    /// Masks string values in `attributes`, descending into nested values.
    pub fn redact_attributes(&self, attributes: &mut Map<String, Value>) {
        for value in attributes.values_mut() {
            self.redact_value(value);
        }
    }

    fn redact_value(&self, value: &mut Value) {
        match value {
            Value::String(text) => {
                if let Cow::Owned(masked) = self.redact(text) {
                    *text = masked;
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.redact_value(item)),
            Value::Object(object) => self.redact_attributes(object),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}
