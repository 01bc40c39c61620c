// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema definitions and the flattened metadata registry built from them.
//!
//! A schema is declared once (in code via [`SchemaBuilder`] or as data via
//! [`SchemaDef`]) and then frozen into a [`Schema`]. Freezing resolves
//! inheritance and produces, per entity type, the ordered list of
//! [`PropertyDescriptor`]s the copier walks:
//!
//! - forward attributes first, supertype attributes before subtype ones, with
//!   `order` equal to the attribute's storage slot (`0..n`);
//! - inverse attributes afterwards, with negative `order` (`-1, -2, ...`) in
//!   the same supertype-first sequence.
use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::TypeName;
use crate::metadata::{InverseAccessor, InverseLink, PropertyDescriptor, SlotAccessor};
use crate::model::Model;
use crate::value::Value;

/// Declared type of an attribute.
///
/// Serialised externally tagged in snake case, e.g. `"text"`,
/// `{"entity": "IFCOWNERHISTORY"}` or `{"list": {"entity": "IFCPRODUCT"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Integer scalar.
    Integer,
    /// Real scalar.
    Real,
    /// Integer or real scalar.
    Number,
    /// String scalar.
    Text,
    /// `.T.` or `.F.`.
    Boolean,
    /// `.T.`, `.F.` or `.U.`.
    Logical,
    /// Binary literal.
    Binary,
    /// Enumeration; an empty item list admits any item.
    Enumeration(Vec<String>),
    /// Reference to an instance of the named entity type or one of its subtypes.
    Entity(TypeName),
    /// Select over entity types and defined types.
    Select(Vec<TypeName>),
    /// Ordered aggregate.
    List(Box<AttributeType>),
    /// Unordered aggregate (stored and copied in source order).
    Set(Box<AttributeType>),
    /// Admits any value.
    Any,
}

impl AttributeType {
    /// Returns `true` if `value`, expressed in the terms of `model`, conforms
    /// to this type.
    ///
    /// [`Value::Unset`] is never admitted here; optionality is a property of
    /// the attribute, see [`PropertyDescriptor::admits`].
    pub fn admits(&self, value: &Value, model: &Model) -> bool {
        let schema = model.schema();
        match (self, value) {
            (_, Value::Unset) => false,
            (Self::Any, _)
            | (_, Value::Derived)
            | (Self::Integer | Self::Number, Value::Integer(_))
            | (Self::Real | Self::Number, Value::Real(_))
            | (Self::Text, Value::Text(_))
            | (Self::Boolean, Value::Logical(Some(_)))
            | (Self::Logical, Value::Logical(_))
            | (Self::Binary, Value::Binary(_)) => true,
            (Self::Enumeration(items), Value::Enum(item)) => {
                items.is_empty() || items.iter().any(|i| i.eq_ignore_ascii_case(item))
            }
            (Self::Entity(expected), Value::Ref(id)) => model
                .type_of(*id)
                .is_some_and(|ty| schema.is_subtype_of(ty, expected)),
            (Self::Select(names), Value::Ref(id)) => model
                .type_of(*id)
                .is_some_and(|ty| names.iter().any(|n| schema.is_subtype_of(ty, n))),
            (Self::Select(names), Value::Typed { type_name, .. }) => names.contains(type_name),
            (Self::List(inner) | Self::Set(inner), Value::List(items)) => {
                items.iter().all(|item| inner.admits(item, model))
            }
            _ => false,
        }
    }

    /// Returns `true` for aggregate types.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_))
    }

    fn referenced_entity(&self) -> Option<&TypeName> {
        match self {
            Self::Entity(name) => Some(name),
            Self::List(inner) | Self::Set(inner) => inner.referenced_entity(),
            _ => None,
        }
    }
}

/// One explicit (stored) attribute of an entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name as used by filters (for example `ObjectPlacement`).
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: AttributeType,
    /// Whether `$` is an acceptable value.
    #[serde(default)]
    pub optional: bool,
}

/// One inverse (derived) attribute of an entity type.
///
/// `name` on the declaring type yields every `holder` instance whose forward
/// attribute `via` references the entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseDef {
    /// Inverse attribute name (for example `IsDefinedBy`).
    pub name: String,
    /// Entity type holding the forward relationship.
    pub holder: TypeName,
    /// Forward attribute on `holder` that points back at this entity.
    pub via: String,
}

/// Declaration of one entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Type name.
    pub name: TypeName,
    /// Direct supertype, if any.
    #[serde(default)]
    pub supertype: Option<TypeName>,
    /// Abstract types cannot be instantiated.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Own explicit attributes, in declaration order.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Own inverse attributes, in declaration order.
    #[serde(default)]
    pub inverses: Vec<InverseDef>,
}

impl EntityDef {
    /// Starts a concrete entity declaration.
    pub fn new(name: &str) -> Self {
        Self {
            name: TypeName::new(name),
            supertype: None,
            is_abstract: false,
            attributes: Vec::new(),
            inverses: Vec::new(),
        }
    }

    /// Sets the direct supertype.
    pub fn supertype(mut self, name: &str) -> Self {
        self.supertype = Some(TypeName::new(name));
        self
    }

    /// Marks the type abstract.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Appends a mandatory attribute.
    pub fn attribute(mut self, name: &str, ty: AttributeType) -> Self {
        self.attributes.push(AttributeDef {
            name: name.to_owned(),
            ty,
            optional: false,
        });
        self
    }

    /// Appends an optional attribute.
    pub fn optional(mut self, name: &str, ty: AttributeType) -> Self {
        self.attributes.push(AttributeDef {
            name: name.to_owned(),
            ty,
            optional: true,
        });
        self
    }

    /// Appends an inverse attribute.
    pub fn inverse(mut self, name: &str, holder: &str, via: &str) -> Self {
        self.inverses.push(InverseDef {
            name: name.to_owned(),
            holder: TypeName::new(holder),
            via: via.to_owned(),
        });
        self
    }
}

/// Serialisable schema declaration (the data form of [`SchemaBuilder`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Schema identifier written into file headers (for example `IFC2X3`).
    pub name: String,
    /// Entity declarations.
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

impl SchemaDef {
    /// Freezes the declaration into a [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        SchemaBuilder {
            name: self.name,
            entities: self.entities,
        }
        .build()
    }
}

/// Errors raised while freezing a schema declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two declarations share a type name.
    #[error("duplicate entity type: {0}")]
    DuplicateType(TypeName),
    /// A supertype is not declared.
    #[error("entity type {ty} names unknown supertype {supertype}")]
    UnknownSupertype {
        /// Declaring type.
        ty: TypeName,
        /// Missing supertype.
        supertype: TypeName,
    },
    /// Inheritance loops back onto itself.
    #[error("inheritance cycle through entity type {0}")]
    InheritanceCycle(TypeName),
    /// An attribute name is declared twice along one inheritance chain.
    #[error("entity type {ty} declares attribute {attribute} more than once")]
    DuplicateAttribute {
        /// Declaring type.
        ty: TypeName,
        /// Repeated attribute name.
        attribute: String,
    },
    /// An entity-typed attribute references an undeclared type.
    #[error("attribute {ty}.{attribute} references unknown entity type {referenced}")]
    UnknownReferencedType {
        /// Declaring type.
        ty: TypeName,
        /// Attribute name.
        attribute: String,
        /// Missing entity type.
        referenced: TypeName,
    },
    /// An inverse names an undeclared holder type.
    #[error("inverse {ty}.{inverse} names unknown holder type {holder}")]
    UnknownInverseHolder {
        /// Declaring type.
        ty: TypeName,
        /// Inverse name.
        inverse: String,
        /// Missing holder type.
        holder: TypeName,
    },
    /// An inverse names a `via` attribute the holder does not have.
    #[error("inverse {ty}.{inverse}: holder {holder} has no forward attribute {via}")]
    UnknownInverseAttribute {
        /// Declaring type.
        ty: TypeName,
        /// Inverse name.
        inverse: String,
        /// Holder type.
        holder: TypeName,
        /// Missing forward attribute.
        via: String,
    },
    /// More attributes than descriptor orders can address.
    #[error("entity type {0} has too many attributes")]
    TooManyAttributes(TypeName),
}

/// Code-first schema declaration.
///
/// # Example
///
/// ```
/// use graft_core::{AttributeType, EntityDef, SchemaBuilder};
///
/// let schema = SchemaBuilder::new("DEMO")
///     .entity(EntityDef::new("NODE").optional("Next", AttributeType::Entity("NODE".into())))
///     .build()
///     .unwrap();
/// assert_eq!(schema.forward_count(&"NODE".into()), Some(1));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    name: String,
    entities: Vec<EntityDef>,
}

impl SchemaBuilder {
    /// Starts an empty schema called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entities: Vec::new(),
        }
    }

    /// Adds one entity declaration.
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.entities.push(def);
        self
    }

    /// Resolves inheritance and builds the descriptor registry.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut entities: BTreeMap<TypeName, EntityDef> = BTreeMap::new();
        for def in self.entities {
            if entities.contains_key(&def.name) {
                return Err(SchemaError::DuplicateType(def.name));
            }
            entities.insert(def.name.clone(), def);
        }

        let mut ancestors: FxHashMap<TypeName, Vec<TypeName>> = FxHashMap::default();
        for (name, def) in &entities {
            let mut chain = vec![name.clone()];
            let mut cursor = def.supertype.clone();
            while let Some(supertype) = cursor {
                if chain.contains(&supertype) {
                    return Err(SchemaError::InheritanceCycle(name.clone()));
                }
                let Some(parent) = entities.get(&supertype) else {
                    return Err(SchemaError::UnknownSupertype {
                        ty: chain.last().cloned().unwrap_or_else(|| name.clone()),
                        supertype,
                    });
                };
                cursor = parent.supertype.clone();
                chain.push(supertype);
            }
            ancestors.insert(name.clone(), chain);
        }

        // Forward layout first: inverses resolve their `via` slot against it.
        let mut layouts: FxHashMap<TypeName, Vec<(&TypeName, &AttributeDef)>> =
            FxHashMap::default();
        for (name, chain) in &ancestors {
            let mut layout: Vec<(&TypeName, &AttributeDef)> = Vec::new();
            for ty in chain.iter().rev() {
                let Some(def) = entities.get(ty) else {
                    continue;
                };
                for attr in &def.attributes {
                    if layout.iter().any(|(_, a)| a.name == attr.name) {
                        return Err(SchemaError::DuplicateAttribute {
                            ty: name.clone(),
                            attribute: attr.name.clone(),
                        });
                    }
                    if let Some(referenced) = attr.ty.referenced_entity() {
                        if !entities.contains_key(referenced) {
                            return Err(SchemaError::UnknownReferencedType {
                                ty: ty.clone(),
                                attribute: attr.name.clone(),
                                referenced: referenced.clone(),
                            });
                        }
                    }
                    layout.push((&def.name, attr));
                }
            }
            layouts.insert(name.clone(), layout);
        }

        let mut properties: FxHashMap<TypeName, Vec<PropertyDescriptor>> = FxHashMap::default();
        for (name, chain) in &ancestors {
            let layout = layouts.get(name).map(Vec::as_slice).unwrap_or_default();
            let mut descriptors = Vec::with_capacity(layout.len());
            for (slot, (declared_on, attr)) in layout.iter().enumerate() {
                let order = i32::try_from(slot)
                    .map_err(|_| SchemaError::TooManyAttributes(name.clone()))?;
                descriptors.push(PropertyDescriptor::new(
                    attr.name.clone(),
                    order,
                    (*declared_on).clone(),
                    attr.ty.clone(),
                    attr.optional,
                    None,
                    Arc::new(SlotAccessor::new(slot)),
                ));
            }

            let mut inverse_order: i32 = 0;
            for ty in chain.iter().rev() {
                let Some(def) = entities.get(ty) else {
                    continue;
                };
                for inverse in &def.inverses {
                    let Some(holder_layout) = layouts.get(&inverse.holder) else {
                        return Err(SchemaError::UnknownInverseHolder {
                            ty: ty.clone(),
                            inverse: inverse.name.clone(),
                            holder: inverse.holder.clone(),
                        });
                    };
                    let Some(via_slot) = holder_layout
                        .iter()
                        .position(|(_, attr)| attr.name == inverse.via)
                    else {
                        return Err(SchemaError::UnknownInverseAttribute {
                            ty: ty.clone(),
                            inverse: inverse.name.clone(),
                            holder: inverse.holder.clone(),
                            via: inverse.via.clone(),
                        });
                    };
                    inverse_order = inverse_order
                        .checked_sub(1)
                        .ok_or_else(|| SchemaError::TooManyAttributes(name.clone()))?;
                    let link = InverseLink {
                        holder: inverse.holder.clone(),
                        via: inverse.via.clone(),
                        via_slot,
                    };
                    descriptors.push(PropertyDescriptor::new(
                        inverse.name.clone(),
                        inverse_order,
                        ty.clone(),
                        AttributeType::Set(Box::new(AttributeType::Entity(
                            inverse.holder.clone(),
                        ))),
                        true,
                        Some(link.clone()),
                        Arc::new(InverseAccessor::new(inverse.name.clone(), link)),
                    ));
                }
            }
            properties.insert(name.clone(), descriptors);
        }

        Ok(Schema {
            name: self.name,
            entities,
            ancestors,
            properties,
        })
    }
}

/// Frozen schema: entity declarations plus the per-type descriptor registry.
///
/// Build once and share behind an [`Arc`]; models hold a reference to the
/// schema they were created for.
#[derive(Debug)]
pub struct Schema {
    name: String,
    entities: BTreeMap<TypeName, EntityDef>,
    /// Type itself first, then each supertype up to the root.
    ancestors: FxHashMap<TypeName, Vec<TypeName>>,
    properties: FxHashMap<TypeName, Vec<PropertyDescriptor>>,
}

impl Schema {
    /// Schema identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration of `ty`, if known.
    #[must_use]
    pub fn entity_def(&self, ty: &TypeName) -> Option<&EntityDef> {
        self.entities.get(ty)
    }

    /// All declared type names in ascending order.
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.entities.keys()
    }

    /// Ordered property descriptors of `ty` (forward, then inverse).
    #[must_use]
    pub fn properties_of(&self, ty: &TypeName) -> Option<&[PropertyDescriptor]> {
        self.properties.get(ty).map(Vec::as_slice)
    }

    /// Looks up one property of `ty` by name.
    #[must_use]
    pub fn property(&self, ty: &TypeName, name: &str) -> Option<&PropertyDescriptor> {
        self.properties_of(ty)?.iter().find(|p| p.name() == name)
    }

    /// Number of stored (forward) attributes of `ty`.
    #[must_use]
    pub fn forward_count(&self, ty: &TypeName) -> Option<usize> {
        self.properties_of(ty)
            .map(|props| props.iter().filter(|p| p.is_forward()).count())
    }

    /// Returns `true` if `ty` is `ancestor` or inherits from it.
    #[must_use]
    pub fn is_subtype_of(&self, ty: &TypeName, ancestor: &TypeName) -> bool {
        self.ancestors
            .get(ty)
            .is_some_and(|chain| chain.contains(ancestor))
    }

    /// Returns `true` if `ty` is declared abstract.
    #[must_use]
    pub fn is_abstract(&self, ty: &TypeName) -> bool {
        self.entities.get(ty).is_some_and(|def| def.is_abstract)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn entity(name: &str) -> AttributeType {
        AttributeType::Entity(TypeName::new(name))
    }

    fn sample() -> Result<Schema, SchemaError> {
        SchemaBuilder::new("TEST")
            .entity(
                EntityDef::new("ROOT")
                    .abstract_type()
                    .attribute("GlobalId", AttributeType::Text)
                    .optional("Name", AttributeType::Text)
                    .inverse("Tags", "TAG", "Targets"),
            )
            .entity(
                EntityDef::new("PART")
                    .supertype("ROOT")
                    .optional("Parent", entity("PART"))
                    .inverse("Children", "PART", "Parent"),
            )
            .entity(
                EntityDef::new("TAG")
                    .attribute("Targets", AttributeType::Set(Box::new(entity("ROOT")))),
            )
            .build()
    }

    #[test]
    fn descriptors_flatten_supertype_first_with_signed_orders() {
        let schema = sample().unwrap();
        let props = schema.properties_of(&TypeName::new("part")).unwrap();
        let summary: Vec<(&str, i32)> = props.iter().map(|p| (p.name(), p.order())).collect();
        assert_eq!(
            summary,
            vec![
                ("GlobalId", 0),
                ("Name", 1),
                ("Parent", 2),
                ("Tags", -1),
                ("Children", -2),
            ]
        );
        assert_eq!(schema.forward_count(&TypeName::new("PART")), Some(3));
        let tags = schema.property(&TypeName::new("PART"), "Tags").unwrap();
        assert!(tags.is_inverse());
        assert_eq!(tags.inverse().map(|l| l.via_slot), Some(0));
    }

    #[test]
    fn subtype_queries_follow_the_chain() {
        let schema = sample().unwrap();
        let part = TypeName::new("PART");
        assert!(schema.is_subtype_of(&part, &TypeName::new("ROOT")));
        assert!(schema.is_subtype_of(&part, &part));
        assert!(!schema.is_subtype_of(&TypeName::new("ROOT"), &part));
        assert!(schema.is_abstract(&TypeName::new("ROOT")));
    }

    #[test]
    fn unknown_supertype_is_rejected() {
        let err = SchemaBuilder::new("BAD")
            .entity(EntityDef::new("A").supertype("MISSING"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSupertype { .. }));
    }

    #[test]
    fn inheritance_cycles_are_rejected() {
        let err = SchemaBuilder::new("BAD")
            .entity(EntityDef::new("A").supertype("B"))
            .entity(EntityDef::new("B").supertype("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InheritanceCycle(_)));
    }

    #[test]
    fn inverse_via_must_exist_on_holder() {
        let err = SchemaBuilder::new("BAD")
            .entity(EntityDef::new("A").inverse("Back", "B", "Missing"))
            .entity(EntityDef::new("B").optional("Forward", entity("A")))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownInverseAttribute { .. }));
    }

    #[test]
    fn duplicate_attributes_along_a_chain_are_rejected() {
        let err = SchemaBuilder::new("BAD")
            .entity(EntityDef::new("A").attribute("X", AttributeType::Integer))
            .entity(
                EntityDef::new("B")
                    .supertype("A")
                    .attribute("X", AttributeType::Real),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAttribute { .. }));
    }
}
