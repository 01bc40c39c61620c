// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types: arena handles, entity labels and schema type names.
use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Strongly typed handle for an entity inside its owning [`crate::Model`].
///
/// `EntityId` is an arena index. It is only meaningful for the model that
/// issued it; handles from a source model must be translated through an
/// [`crate::IdentityMap`] before they can be used against a destination.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(u32);

impl EntityId {
    /// Constructs an `EntityId` from a raw arena index.
    ///
    /// Intended for tooling and tests; model operations reject handles that
    /// were not issued by the model with [`crate::ModelError::UnknownEntity`].
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }
}

/// Stable `#n` label of an entity, unique within its model.
///
/// Labels are what the canonical text format prints and what label-preserving
/// copies carry across models. Zero is reserved as invalid.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct EntityLabel(u64);

impl EntityLabel {
    /// Constructs a label from its integer value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the integer value of the label.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upper-case schema type name (for example `IFCWALL`).
///
/// Construction normalises to ASCII upper case so that lookups behave like
/// the case-insensitive identifiers of the canonical text format.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// Creates a type name, normalising it to upper case.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_ascii_uppercase())
    }

    /// Returns the normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TypeName {
    fn from(mut name: String) -> Self {
        name.make_ascii_uppercase();
        Self(name)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<TypeName> for String {
    fn from(name: TypeName) -> Self {
        name.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_normalise_case() {
        assert_eq!(TypeName::new("IfcWall"), TypeName::new("IFCWALL"));
        assert_eq!(TypeName::from(String::from("ifcslab")).as_str(), "IFCSLAB");
    }

    #[test]
    fn labels_render_with_hash_prefix() {
        assert_eq!(EntityLabel::from_raw(42).to_string(), "#42");
    }

    #[test]
    fn entity_id_index_round_trips() {
        let id = EntityId::from_index(7);
        assert_eq!(id, Some(EntityId::from_raw(7)));
        assert_eq!(id.map(EntityId::index), Some(7));
    }
}
