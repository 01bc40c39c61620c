// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph copier: replicates the subgraph reachable from a root entity.
//!
//! The walk keeps an explicit stack of frames instead of recursing, so
//! reference chains of any depth run in constant native stack. Visitation
//! order matches a recursive pre-order copy:
//!
//! 1. an entity is created and registered in the identity map before any of
//!    its properties are visited;
//! 2. forward properties are visited in declared order;
//! 3. within a property, references are followed in element order, and each
//!    newly encountered entity is copied completely before its referrer
//!    continues;
//! 4. with inverse copying enabled, inverse properties are visited last.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::filter::{FilterOutcome, PropertyFilter};
use crate::ident::{EntityId, TypeName};
use crate::identity::IdentityMap;
use crate::metadata::PropertyDescriptor;
use crate::model::{Model, ModelError};
use crate::schema::Schema;
use crate::tx::TxId;
use crate::value::Value;

/// Errors raised by [`copy_entity`] and the session helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyError {
    /// The transaction is not the destination's open transaction.
    #[error("transaction {0} is not open on the destination model")]
    TransactionState(TxId),
    /// The type has no metadata in the source schema or is missing from the
    /// destination schema.
    #[error("unknown entity type: {0}")]
    UnknownType(TypeName),
    /// The source root does not exist.
    #[error("source entity {0:?} does not exist")]
    UnknownSource(EntityId),
    /// A substituted value does not fit the destination property.
    #[error("{found} value does not fit {type_name}.{property}")]
    SchemaMismatch {
        /// Destination entity type.
        type_name: TypeName,
        /// Property name.
        property: String,
        /// Shape of the rejected value.
        found: &'static str,
    },
    /// The destination type lacks a property the source type has.
    #[error("destination type {type_name} has no property {property}")]
    MissingProperty {
        /// Destination entity type.
        type_name: TypeName,
        /// Property name.
        property: String,
    },
    /// A source entity is already mapped to a different destination entity.
    #[error("{entity:?} is already mapped to {existing:?}, refusing {attempted:?}")]
    IdentityConflict {
        /// Source handle.
        entity: EntityId,
        /// Registered destination.
        existing: EntityId,
        /// Rejected destination.
        attempted: EntityId,
    },
    /// Error surfaced by the destination model.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Knobs for one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Also copy the holders of inverse relationships.
    pub copy_inverse_relations: bool,
    /// Follow entity references; when `false` every property whose value
    /// contains a reference is left unset.
    pub deep: bool,
    /// Give each destination entity the label of its source entity.
    pub keep_labels: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            copy_inverse_relations: false,
            deep: true,
            keep_labels: false,
        }
    }
}

/// Copies `root` and what it reaches from `source` into `destination`.
///
/// Entities already present in `identity` are reused, never copied twice.
/// Returns the destination handle of `root`.
///
/// # Errors
/// - [`CopyError::TransactionState`] when `tx` is not the destination's
///   open transaction (checked before anything is created).
/// - [`CopyError::UnknownSource`], [`CopyError::UnknownType`],
///   [`CopyError::SchemaMismatch`], [`CopyError::MissingProperty`].
///
/// On error the destination may hold partially copied entities; abort the
/// transaction to discard them (see [`crate::replicate`]).
pub fn copy_entity(
    source: &Model,
    root: EntityId,
    destination: &mut Model,
    tx: TxId,
    identity: &mut IdentityMap,
    options: CopyOptions,
    filter: &dyn PropertyFilter,
) -> Result<EntityId, CopyError> {
    if !destination.is_active(tx) {
        return Err(CopyError::TransactionState(tx));
    }
    let root_label = source
        .label_of(root)
        .ok_or(CopyError::UnknownSource(root))?;
    if let Some(existing) = identity.lookup(root) {
        trace!(root = %root_label, "root already copied");
        return Ok(existing);
    }

    let mut copier = Copier {
        source,
        dest_schema: Arc::clone(destination.schema()),
        destination,
        identity,
        options,
        filter,
        created: 0,
    };
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let dest_root = copier.open_frame(root, &mut stack)?;
    while let Some(frame) = stack.last_mut() {
        match copier.advance(frame)? {
            Step::Descend(child) => {
                copier.open_frame(child, &mut stack)?;
            }
            Step::Done => {
                stack.pop();
            }
        }
    }
    info!(root = %root_label, created = copier.created, "root copied");
    Ok(dest_root)
}

enum Step {
    Descend(EntityId),
    Done,
}

enum Deferred {
    /// Translate this source value once every reference is mapped.
    Assign(Value),
    /// Attach the inverse's forward link on every holder.
    Link,
}

struct Pending {
    property: usize,
    deferred: Deferred,
    refs: Vec<EntityId>,
    next: usize,
}

/// One entity being copied.
struct Frame<'s> {
    source: EntityId,
    dest: EntityId,
    type_name: TypeName,
    properties: &'s [PropertyDescriptor],
    cursor: usize,
    pending: Option<Pending>,
}

struct Copier<'s, 'a> {
    source: &'s Model,
    destination: &'a mut Model,
    dest_schema: Arc<Schema>,
    identity: &'a mut IdentityMap,
    options: CopyOptions,
    filter: &'a dyn PropertyFilter,
    created: usize,
}

impl<'s> Copier<'s, '_> {
    fn open_frame(
        &mut self,
        source_id: EntityId,
        stack: &mut Vec<Frame<'s>>,
    ) -> Result<EntityId, CopyError> {
        let source: &'s Model = self.source;
        let record = source
            .entity(source_id)
            .map_err(|_| CopyError::UnknownSource(source_id))?;
        let type_name = record.type_name().clone();
        let properties = source
            .metadata()
            .properties_of(&type_name)
            .ok_or_else(|| CopyError::UnknownType(type_name.clone()))?;
        if self.dest_schema.entity_def(&type_name).is_none() {
            return Err(CopyError::UnknownType(type_name));
        }
        let created = if self.options.keep_labels {
            self.destination
                .create_entity_with_label(&type_name, record.label())
        } else {
            self.destination.create_entity(&type_name)
        };
        let dest = created.map_err(|err| match err {
            ModelError::UnknownType(ty) | ModelError::AbstractType(ty) => {
                CopyError::UnknownType(ty)
            }
            other => CopyError::Model(other),
        })?;
        self.identity.register(source_id, dest)?;
        self.created += 1;
        debug!(
            source = %record.label(),
            dest = ?self.destination.label_of(dest),
            ty = %type_name,
            "entity created"
        );
        stack.push(Frame {
            source: source_id,
            dest,
            type_name,
            properties,
            cursor: 0,
            pending: None,
        });
        Ok(dest)
    }

    fn advance(&mut self, frame: &mut Frame<'s>) -> Result<Step, CopyError> {
        loop {
            if let Some(pending) = frame.pending.as_mut() {
                if let Some(child) = self.next_unmapped(pending) {
                    return Ok(Step::Descend(child));
                }
            }
            if let Some(pending) = frame.pending.take() {
                self.finish(frame, pending)?;
                continue;
            }
            let index = frame.cursor;
            let Some(property) = frame.properties.get(index) else {
                return Ok(Step::Done);
            };
            frame.cursor += 1;
            if property.is_forward() {
                self.visit_forward(frame, index)?;
            } else if self.options.copy_inverse_relations {
                self.visit_inverse(frame, index)?;
            }
        }
    }

    fn next_unmapped(&self, pending: &mut Pending) -> Option<EntityId> {
        while let Some(next) = pending.refs.get(pending.next) {
            if self.identity.lookup(*next).is_none() {
                return Some(*next);
            }
            pending.next += 1;
        }
        None
    }

    fn decide(
        &self,
        property: &PropertyDescriptor,
        entity: EntityId,
    ) -> Result<FilterOutcome, CopyError> {
        let view = self.source.view(entity)?;
        let outcome = self.filter.filter(property, view);
        trace!(
            entity = %view.label(),
            property = property.name(),
            ?outcome,
            "filter decision"
        );
        Ok(outcome)
    }

    fn visit_forward(&mut self, frame: &mut Frame<'s>, index: usize) -> Result<(), CopyError> {
        let properties = frame.properties;
        let Some(property) = properties.get(index) else {
            return Ok(());
        };
        match self.decide(property, frame.source)? {
            FilterOutcome::Suppress => Ok(()),
            FilterOutcome::Substitute(value) => self.substitute(frame, property, value),
            FilterOutcome::Copy => {
                let value = property.get(self.source, frame.source)?;
                if value.is_unset() {
                    return Ok(());
                }
                if !value.contains_refs() {
                    return self.assign(frame, property, value);
                }
                if !self.options.deep {
                    return Ok(());
                }
                frame.pending = Some(Pending {
                    property: index,
                    refs: value.entity_refs(),
                    deferred: Deferred::Assign(value),
                    next: 0,
                });
                Ok(())
            }
        }
    }

    fn visit_inverse(&mut self, frame: &mut Frame<'s>, index: usize) -> Result<(), CopyError> {
        let properties = frame.properties;
        let Some(property) = properties.get(index) else {
            return Ok(());
        };
        match self.decide(property, frame.source)? {
            FilterOutcome::Suppress => Ok(()),
            FilterOutcome::Substitute(value) => Err(CopyError::SchemaMismatch {
                type_name: frame.type_name.clone(),
                property: property.name().to_owned(),
                found: value.kind_name(),
            }),
            FilterOutcome::Copy => {
                let holders = property.get(self.source, frame.source)?.entity_refs();
                if !holders.is_empty() {
                    frame.pending = Some(Pending {
                        property: index,
                        refs: holders,
                        deferred: Deferred::Link,
                        next: 0,
                    });
                }
                Ok(())
            }
        }
    }

    fn finish(&mut self, frame: &Frame<'s>, pending: Pending) -> Result<(), CopyError> {
        let properties = frame.properties;
        let Some(property) = properties.get(pending.property) else {
            return Ok(());
        };
        match pending.deferred {
            Deferred::Assign(value) => {
                let identity = &*self.identity;
                let translated = value.try_map_refs(&mut |source_ref| {
                    identity.lookup(source_ref).ok_or_else(|| {
                        CopyError::Model(ModelError::InternalCorruption("reference left unmapped"))
                    })
                })?;
                self.assign(frame, property, translated)
            }
            Deferred::Link => {
                for holder in pending.refs {
                    self.attach_link(frame, property, holder)?;
                }
                Ok(())
            }
        }
    }

    fn dest_property(
        &self,
        type_name: &TypeName,
        name: &str,
    ) -> Result<&PropertyDescriptor, CopyError> {
        self.dest_schema
            .property(type_name, name)
            .ok_or_else(|| CopyError::MissingProperty {
                type_name: type_name.clone(),
                property: name.to_owned(),
            })
    }

    fn assign(
        &mut self,
        frame: &Frame<'s>,
        property: &PropertyDescriptor,
        value: Value,
    ) -> Result<(), CopyError> {
        let schema = Arc::clone(&self.dest_schema);
        let target = schema
            .property(&frame.type_name, property.name())
            .ok_or_else(|| CopyError::MissingProperty {
                type_name: frame.type_name.clone(),
                property: property.name().to_owned(),
            })?;
        target.set(self.destination, frame.dest, value)?;
        Ok(())
    }

    fn substitute(
        &mut self,
        frame: &Frame<'s>,
        property: &PropertyDescriptor,
        value: Value,
    ) -> Result<(), CopyError> {
        let target = self.dest_property(&frame.type_name, property.name())?;
        if !target.admits(&value, self.destination) {
            return Err(CopyError::SchemaMismatch {
                type_name: frame.type_name.clone(),
                property: property.name().to_owned(),
                found: value.kind_name(),
            });
        }
        self.assign(frame, property, value)
    }

    /// Points the copied `holder`'s forward attribute at `frame.dest` when the
    /// copy did not already do so.
    ///
    /// The filter is asked about `via` on the source holder, also for holders
    /// copied by an earlier root of the same session. A withheld `via` leaves
    /// the inverse empty.
    fn attach_link(
        &mut self,
        frame: &Frame<'s>,
        property: &PropertyDescriptor,
        holder: EntityId,
    ) -> Result<(), CopyError> {
        let Some(link) = property.inverse() else {
            return Ok(());
        };
        let dest_holder = self.identity.lookup(holder).ok_or_else(|| {
            CopyError::Model(ModelError::InternalCorruption("inverse holder left unmapped"))
        })?;
        let holder_type = self
            .destination
            .type_of(dest_holder)
            .cloned()
            .ok_or_else(|| CopyError::Model(ModelError::UnknownEntity(dest_holder)))?;
        let schema = Arc::clone(&self.dest_schema);
        let via = schema
            .property(&holder_type, &link.via)
            .ok_or_else(|| CopyError::MissingProperty {
                type_name: holder_type.clone(),
                property: link.via.clone(),
            })?;
        let current = via.get(self.destination, dest_holder)?;
        if current.refers_to(frame.dest) {
            return Ok(());
        }
        if !self.source_allows(holder, &link.via)? {
            trace!(holder = ?dest_holder, via = %link.via, "inverse link withheld");
            return Ok(());
        }
        let linked = if via.attribute_type().is_aggregate() {
            let mut items = match current {
                Value::List(items) => items,
                _ => Vec::new(),
            };
            items.push(Value::Ref(frame.dest));
            Value::List(items)
        } else {
            Value::Ref(frame.dest)
        };
        trace!(holder = ?dest_holder, via = %link.via, "inverse link attached");
        via.set(self.destination, dest_holder, linked)?;
        Ok(())
    }

    /// Whether the filter copies `via` of the source `holder` as-is.
    fn source_allows(&self, holder: EntityId, via: &str) -> Result<bool, CopyError> {
        let source: &'s Model = self.source;
        let holder_type = source
            .type_of(holder)
            .ok_or(CopyError::UnknownSource(holder))?;
        let property = source
            .metadata()
            .properties_of(holder_type)
            .and_then(|properties| properties.iter().find(|p| p.name() == via))
            .ok_or_else(|| CopyError::MissingProperty {
                type_name: holder_type.clone(),
                property: via.to_owned(),
            })?;
        Ok(matches!(self.decide(property, holder)?, FilterOutcome::Copy))
    }
}
