use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::Field;
use crate::product::Product;

/// The four-member input of a command invocation.
///
/// Members the caller leaves out stay [`Field::Absent`] so dispatch can tell
/// "unset" apart from "set but empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Target product; cross-product when omitted.
    #[serde(default)]
    pub product: Product,
    /// Primary target identifier. Its meaning depends on the command.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub subject: Field<String>,
    /// Command parameters.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub parameters: Field<Map<String, Value>>,
    /// Dot-delimited field paths the caller wants in the response.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub response_fields: Field<Vec<String>>,
}

impl CommandEnvelope {
    /// Creates an envelope for the given product with every other member
    /// absent.
    #[must_use]
    pub fn for_product(product: Product) -> Self {
        Self {
            product,
            ..Self::default()
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Field::from_option(Some(subject.into()));
        self
    }

    /// Sets the parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Field::from_option(Some(parameters));
        self
    }

    /// Sets the response field paths.
    #[must_use]
    pub fn with_response_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.response_fields = Field::from_option(Some(fields));
        self
    }

    /// Returns the requested field paths, or an empty slice when the caller
    /// asked for no projection.
    #[must_use]
    pub fn projection(&self) -> &[String] {
        match self.response_fields.present() {
            Some(fields) => fields.as_slice(),
            None => &[],
        }
    }
}
