// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property descriptors and the metadata provider seam.
//!
//! A [`PropertyDescriptor`] is the copier's view of one attribute: its name,
//! signed order, declared type and a type-erased [`PropertyAccessor`] that
//! knows how to read (and for forward attributes, write) the value on a
//! concrete entity.
use std::fmt;
use std::sync::Arc;

use crate::ident::{EntityId, TypeName};
use crate::model::{Model, ModelError};
use crate::schema::{AttributeType, EntityDef, Schema};
use crate::value::Value;

/// Reads and writes one property on entities of a model.
///
/// Implementations must be deterministic: two reads of an unchanged model
/// yield identical values.
pub trait PropertyAccessor: fmt::Debug + Send + Sync {
    /// Reads the property of `entity`.
    fn get(&self, model: &Model, entity: EntityId) -> Result<Value, ModelError>;

    /// Writes the property of `entity` inside the open transaction.
    fn set(&self, model: &mut Model, entity: EntityId, value: Value) -> Result<(), ModelError>;
}

/// Accessor for an explicit attribute stored at a fixed slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotAccessor {
    slot: usize,
}

impl SlotAccessor {
    pub(crate) const fn new(slot: usize) -> Self {
        Self { slot }
    }
}

impl PropertyAccessor for SlotAccessor {
    fn get(&self, model: &Model, entity: EntityId) -> Result<Value, ModelError> {
        model.value_at(entity, self.slot).cloned()
    }

    fn set(&self, model: &mut Model, entity: EntityId, value: Value) -> Result<(), ModelError> {
        model.set_value_at(entity, self.slot, value)
    }
}

/// Where an inverse attribute's forward counterpart lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseLink {
    /// Entity type holding the forward reference.
    pub holder: TypeName,
    /// Name of the forward attribute on `holder`.
    pub via: String,
    /// Storage slot of `via` on `holder` (and on every subtype of it).
    pub via_slot: usize,
}

/// Accessor for an inverse attribute, computed from the model's reverse index.
#[derive(Debug, Clone)]
pub(crate) struct InverseAccessor {
    name: String,
    link: InverseLink,
}

impl InverseAccessor {
    pub(crate) const fn new(name: String, link: InverseLink) -> Self {
        Self { name, link }
    }
}

impl PropertyAccessor for InverseAccessor {
    fn get(&self, model: &Model, entity: EntityId) -> Result<Value, ModelError> {
        model.entity(entity)?;
        let schema = model.schema();
        let mut holders: Vec<_> = model
            .referrers(entity)
            .filter_map(|holder| model.view(holder).ok())
            .filter(|view| schema.is_subtype_of(view.type_name(), &self.link.holder))
            .filter(|view| {
                view.record()
                    .values()
                    .get(self.link.via_slot)
                    .is_some_and(|v| v.refers_to(entity))
            })
            .map(|view| (view.label(), view.id()))
            .collect();
        holders.sort_unstable();
        Ok(Value::List(
            holders.into_iter().map(|(_, id)| Value::Ref(id)).collect(),
        ))
    }

    fn set(&self, model: &mut Model, entity: EntityId, _value: Value) -> Result<(), ModelError> {
        let type_name = model.entity(entity)?.type_name().clone();
        Err(ModelError::ReadOnlyProperty {
            type_name,
            property: self.name.clone(),
        })
    }
}

/// Metadata for one property of an entity type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    order: i32,
    declared_on: TypeName,
    ty: AttributeType,
    optional: bool,
    inverse: Option<InverseLink>,
    accessor: Arc<dyn PropertyAccessor>,
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("declared_on", &self.declared_on)
            .field("ty", &self.ty)
            .field("optional", &self.optional)
            .field("inverse", &self.inverse)
            .finish_non_exhaustive()
    }
}

impl PropertyDescriptor {
    pub(crate) fn new(
        name: String,
        order: i32,
        declared_on: TypeName,
        ty: AttributeType,
        optional: bool,
        inverse: Option<InverseLink>,
        accessor: Arc<dyn PropertyAccessor>,
    ) -> Self {
        Self {
            name,
            order,
            declared_on,
            ty,
            optional,
            inverse,
            accessor,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signed order: `>= 0` is the storage slot of a forward attribute,
    /// `< 0` marks an inverse attribute.
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// Storage slot for forward attributes.
    pub fn slot(&self) -> Option<usize> {
        usize::try_from(self.order).ok()
    }

    /// Type that declares the attribute (possibly a supertype).
    pub const fn declared_on(&self) -> &TypeName {
        &self.declared_on
    }

    /// Declared attribute type.
    pub const fn attribute_type(&self) -> &AttributeType {
        &self.ty
    }

    /// Whether `$` is acceptable.
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns `true` for stored attributes.
    pub const fn is_forward(&self) -> bool {
        self.order >= 0
    }

    /// Returns `true` for inverse attributes.
    pub const fn is_inverse(&self) -> bool {
        self.order < 0
    }

    /// Forward counterpart of an inverse attribute.
    pub const fn inverse(&self) -> Option<&InverseLink> {
        self.inverse.as_ref()
    }

    /// Reads this property of `entity`.
    pub fn get(&self, model: &Model, entity: EntityId) -> Result<Value, ModelError> {
        self.accessor.get(model, entity)
    }

    /// Writes this property of `entity`.
    pub fn set(&self, model: &mut Model, entity: EntityId, value: Value) -> Result<(), ModelError> {
        self.accessor.set(model, entity, value)
    }

    /// Returns `true` if `value` may be stored in this property of an entity
    /// of `model`.
    pub fn admits(&self, value: &Value, model: &Model) -> bool {
        if value.is_unset() {
            return self.optional;
        }
        self.ty.admits(value, model)
    }
}

/// Schema metadata consumed by the copier.
///
/// [`Schema`] is the provided implementation; alternative providers (for
/// example views that hide attributes) can be plugged in through this seam.
pub trait MetadataProvider {
    /// Ordered descriptors of `ty`: forward attributes (`order >= 0`)
    /// followed by inverse attributes (`order < 0`).
    fn properties_of(&self, ty: &TypeName) -> Option<&[PropertyDescriptor]>;

    /// Returns `true` if `ty` is `ancestor` or one of its subtypes.
    fn is_subtype_of(&self, ty: &TypeName, ancestor: &TypeName) -> bool;

    /// Declaration of `ty`, if known.
    fn entity_def(&self, ty: &TypeName) -> Option<&EntityDef>;
}

impl MetadataProvider for Schema {
    fn properties_of(&self, ty: &TypeName) -> Option<&[PropertyDescriptor]> {
        Self::properties_of(self, ty)
    }

    fn is_subtype_of(&self, ty: &TypeName, ancestor: &TypeName) -> bool {
        Self::is_subtype_of(self, ty, ancestor)
    }

    fn entity_def(&self, ty: &TypeName) -> Option<&EntityDef> {
        Self::entity_def(self, ty)
    }
}
