//! Declared command parameters.

use serde_json::Value;

/// Accepted shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A string.
    String,
    /// An integer within an inclusive range. Numeric strings are accepted.
    Integer {
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// A boolean. The strings `"true"` and `"false"` are accepted.
    Boolean,
    /// A list of strings. A single string becomes a one-element list.
    StringList,
}

impl ParamKind {
    fn describe(self) -> String {
        match self {
            Self::String => "a string".to_owned(),
            Self::Integer { min, max } => format!("an integer between {min} and {max}"),
            Self::Boolean => "a boolean".to_owned(),
            Self::StringList => "a list of strings".to_owned(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    required: bool,
    default: Option<Value>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Declares a string parameter.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    /// Declares a bounded integer parameter.
    #[must_use]
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, ParamKind::Integer { min, max })
    }

    /// Declares a boolean parameter.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    /// Declares a string-list parameter.
    #[must_use]
    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::StringList)
    }

    /// Marks the parameter as mandatory.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value substituted when the caller omits the parameter.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Accepted shape.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Whether the caller must supply the parameter.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Default value, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Checks a supplied value and converts it to its canonical form.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value has the wrong shape or
    /// lies outside the declared range.
    pub fn normalize(&self, value: &Value) -> Result<Value, String> {
        let normalized = match (self.kind, value) {
            (ParamKind::String, Value::String(_)) => Some(value.clone()),
            (ParamKind::Integer { min, max }, _) => {
                let number = integer_of(value).ok_or_else(|| self.expected(value))?;
                if number < min || number > max {
                    return Err(format!(
                        "{number} is out of range; expected {}",
                        self.kind.describe()
                    ));
                }
                Some(Value::from(number))
            }
            (ParamKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamKind::Boolean, Value::String(text)) => match text.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (ParamKind::StringList, Value::String(text)) => {
                Some(Value::Array(vec![Value::String(text.clone())]))
            }
            (ParamKind::StringList, Value::Array(items)) if items.iter().all(Value::is_string) => {
                Some(value.clone())
            }
            _ => None,
        };
        normalized.ok_or_else(|| self.expected(value))
    }

    fn expected(&self, value: &Value) -> String {
        format!("expected {}, got {}", self.kind.describe(), kind_of(value))
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
