use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Backend product a command invocation targets.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Product {
    /// Cross-product invocation; the default when a caller omits the product.
    #[default]
    Atlassian,
    /// The work-tracking product.
    Jira,
    /// The document and collaboration product.
    Confluence,
}

impl Product {
    /// Every product, in declaration order.
    pub const ALL: [Self; 3] = [Self::Atlassian, Self::Jira, Self::Confluence];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Error returned when a product name is not recognised.
pub type ProductParseError = strum::ParseError;
