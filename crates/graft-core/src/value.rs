// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property values stored on entities.

use crate::ident::{EntityId, TypeName};

/// Value of a single entity property.
///
/// The shape mirrors what the canonical text format can express: unset and
/// derived markers, scalars, entity references, ordered aggregates and
/// select-typed scalars (`IFCLABEL('x')`).
///
/// Invariants
/// - `Ref` handles are only meaningful for the model that holds the value.
/// - Aggregates preserve element order; duplicates are allowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value (`$`).
    #[default]
    Unset,
    /// Attribute re-declared as derived in a subtype (`*`).
    Derived,
    /// Integer scalar.
    Integer(i64),
    /// Real scalar.
    Real(f64),
    /// String scalar (already unescaped).
    Text(String),
    /// Boolean or logical (`.T.`, `.F.`, `.U.` as `None`).
    Logical(Option<bool>),
    /// Enumeration item, without the surrounding dots.
    Enum(String),
    /// Binary literal as its hex digits.
    Binary(String),
    /// Reference to another entity of the same model.
    Ref(EntityId),
    /// Ordered aggregate (LIST, SET, BAG, ARRAY).
    List(Vec<Value>),
    /// Scalar wrapped in a named defined type, as used by select attributes.
    Typed {
        /// Defined type name (for example `IFCLABEL`).
        type_name: TypeName,
        /// Wrapped value.
        value: Box<Value>,
    },
}

impl Value {
    /// Returns `true` for [`Value::Unset`].
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Short name of the value shape, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Derived => "derived",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Logical(_) => "logical",
            Self::Enum(_) => "enumeration",
            Self::Binary(_) => "binary",
            Self::Ref(_) => "entity reference",
            Self::List(_) => "aggregate",
            Self::Typed { .. } => "typed value",
        }
    }

    /// All entity references in depth-first element order (duplicates kept).
    #[must_use]
    pub fn entity_refs(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<EntityId>) {
        match self {
            Self::Ref(id) => out.push(*id),
            Self::List(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Self::Typed { value, .. } => value.collect_refs(out),
            _ => {}
        }
    }

    /// Returns `true` if the value holds at least one entity reference.
    #[must_use]
    pub fn contains_refs(&self) -> bool {
        match self {
            Self::Ref(_) => true,
            Self::List(items) => items.iter().any(Self::contains_refs),
            Self::Typed { value, .. } => value.contains_refs(),
            _ => false,
        }
    }

    /// Returns `true` if the value references `target` anywhere.
    #[must_use]
    pub fn refers_to(&self, target: EntityId) -> bool {
        match self {
            Self::Ref(id) => *id == target,
            Self::List(items) => items.iter().any(|item| item.refers_to(target)),
            Self::Typed { value, .. } => value.refers_to(target),
            _ => false,
        }
    }

    /// Rebuilds the value with every reference rewritten by `f`.
    ///
    /// Structure and element order are preserved; scalars are cloned verbatim.
    pub fn try_map_refs<E, F>(&self, f: &mut F) -> Result<Self, E>
    where
        F: FnMut(EntityId) -> Result<EntityId, E>,
    {
        Ok(match self {
            Self::Ref(id) => Self::Ref(f(*id)?),
            Self::List(items) => Self::List(
                items
                    .iter()
                    .map(|item| item.try_map_refs(f))
                    .collect::<Result<Vec<_>, E>>()?,
            ),
            Self::Typed { type_name, value } => Self::Typed {
                type_name: type_name.clone(),
                value: Box::new(value.try_map_refs(f)?),
            },
            other => other.clone(),
        })
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Logical(Some(value))
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Self::Ref(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> EntityId {
        EntityId::from_raw(n)
    }

    #[test]
    fn refs_are_collected_in_element_order() {
        let value = Value::List(vec![
            Value::Ref(id(3)),
            Value::Integer(1),
            Value::List(vec![Value::Ref(id(1)), Value::Ref(id(3))]),
            Value::Typed {
                type_name: TypeName::new("IFCLABEL"),
                value: Box::new(Value::Ref(id(2))),
            },
        ]);
        assert_eq!(value.entity_refs(), vec![id(3), id(1), id(3), id(2)]);
        assert!(value.contains_refs());
        assert!(value.refers_to(id(2)));
        assert!(!value.refers_to(id(9)));
    }

    #[test]
    fn map_refs_preserves_structure() {
        let value = Value::List(vec![Value::Ref(id(1)), Value::Text("a".into())]);
        let mapped: Result<Value, ()> = value.try_map_refs(&mut |r| Ok(id(r.value() + 10)));
        assert_eq!(
            mapped,
            Ok(Value::List(vec![Value::Ref(id(11)), Value::Text("a".into())]))
        );
    }

    #[test]
    fn map_refs_propagates_failure() {
        let value = Value::List(vec![Value::Ref(id(1))]);
        let mapped: Result<Value, &str> = value.try_map_refs(&mut |_| Err("unmapped"));
        assert_eq!(mapped, Err("unmapped"));
    }

    #[test]
    fn scalars_hold_no_refs() {
        assert!(!Value::Real(1.5).contains_refs());
        assert!(Value::Unset.is_unset());
        assert_eq!(Value::default(), Value::Unset);
    }
}
