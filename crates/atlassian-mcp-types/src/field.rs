use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Values that have a natural "empty" form.
pub trait IsEmpty {
    /// Returns `true` when the value carries no content.
    fn is_empty_value(&self) -> bool;
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for Map<String, Value> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

/// Tri-state optional envelope member.
///
/// `Absent` means the caller never set the member (missing key or JSON
/// `null`). `Empty` means the caller sent the member with no content, for
/// example `""` or `{}`. The two are never conflated: commands may give
/// them different meanings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// The member was not supplied.
    #[default]
    Absent,
    /// The member was supplied but empty.
    Empty,
    /// The member was supplied with content.
    Present(T),
}

impl<T: IsEmpty> Field<T> {
    /// Classifies an optional value.
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            None => Self::Absent,
            Some(inner) if inner.is_empty_value() => Self::Empty,
            Some(inner) => Self::Present(inner),
        }
    }
}

impl<T> Field<T> {
    /// Returns `true` when the member was not supplied.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` when the member was supplied but empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the content when present.
    #[must_use]
    pub const fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Empty => None,
        }
    }
}

impl<T> From<T> for Field<T>
where
    T: IsEmpty,
{
    fn from(value: T) -> Self {
        Self::from_option(Some(value))
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de> + IsEmpty,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}

impl<T> Serialize for Field<T>
where
    T: Serialize + Default,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Empty => T::default().serialize(serializer),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}
