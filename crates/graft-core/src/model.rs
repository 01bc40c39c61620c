// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory entity model store with journalled transactions.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::ident::{EntityId, EntityLabel, TypeName};
use crate::metadata::MetadataProvider;
use crate::schema::Schema;
use crate::tx::{CommitSummary, TxId};
use crate::value::Value;

/// Errors emitted by the model store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A mutation was attempted with no open transaction.
    #[error("no active transaction")]
    NoActiveTransaction,
    /// [`Model::begin`] was called while another transaction is open.
    #[error("transaction {0} is already open")]
    TransactionAlreadyOpen(TxId),
    /// The supplied transaction identifier is zero, stale or foreign.
    #[error("transaction not active: {0}")]
    UnknownTx(TxId),
    /// The type is not declared by the model's schema.
    #[error("unknown entity type: {0}")]
    UnknownType(TypeName),
    /// The type is declared abstract and cannot be instantiated.
    #[error("entity type {0} is abstract")]
    AbstractType(TypeName),
    /// The handle does not name an entity of this model.
    #[error("unknown entity: {0:?}")]
    UnknownEntity(EntityId),
    /// Another entity already carries the label.
    #[error("label {0} is already in use")]
    DuplicateLabel(EntityLabel),
    /// Label zero is reserved.
    #[error("label #0 is invalid")]
    InvalidLabel,
    /// Slot index beyond the entity's attribute count.
    #[error("slot {slot} out of range for {entity:?} with {len} attributes")]
    SlotOutOfRange {
        /// Entity written to.
        entity: EntityId,
        /// Requested slot.
        slot: usize,
        /// Attribute count of the entity.
        len: usize,
    },
    /// The type has no property with that name.
    #[error("entity type {type_name} has no property {property}")]
    UnknownProperty {
        /// Entity type.
        type_name: TypeName,
        /// Requested property.
        property: String,
    },
    /// Inverse properties are derived and cannot be written.
    #[error("property {type_name}.{property} is derived and read-only")]
    ReadOnlyProperty {
        /// Entity type.
        type_name: TypeName,
        /// Property name.
        property: String,
    },
    /// Commit found a required attribute left unset; the transaction was
    /// rolled back.
    #[error("constraint violation: {label}={type_name} leaves required {property} unset")]
    ConstraintViolation {
        /// Offending entity.
        label: EntityLabel,
        /// Its type.
        type_name: TypeName,
        /// Unset required attribute.
        property: String,
    },
    /// Arena index or label space exhausted.
    #[error("model capacity exceeded")]
    CapacityExceeded,
    /// Internal invariant violated (store corruption).
    #[error("internal invariant violated: {0}")]
    InternalCorruption(&'static str),
}

/// Store behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    /// Reject commits that leave a non-optional attribute unset.
    pub enforce_required: bool,
    /// First label handed out by [`Model::create_entity`].
    pub first_label: u64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            enforce_required: false,
            first_label: 1,
        }
    }
}

/// Stored state of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    label: EntityLabel,
    ty: TypeName,
    values: Vec<Value>,
}

impl EntityRecord {
    /// `#n` label.
    pub const fn label(&self) -> EntityLabel {
        self.label
    }

    /// Concrete type.
    pub const fn type_name(&self) -> &TypeName {
        &self.ty
    }

    /// Forward attribute values indexed by slot.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[derive(Debug)]
enum JournalEntry {
    Created(EntityId),
    Assigned {
        entity: EntityId,
        slot: usize,
        previous: Value,
    },
}

#[derive(Debug)]
struct OpenTx {
    id: TxId,
    label: String,
    journal: Vec<JournalEntry>,
    touched: BTreeSet<EntityId>,
}

/// In-memory population of entities conforming to one [`Schema`].
///
/// Entities live in an arena addressed by [`EntityId`] and carry a unique
/// [`EntityLabel`]. The store keeps a reverse-reference index so inverse
/// attributes can be answered without scanning.
///
/// Mutations happen inside a single open transaction at a time; every
/// mutation is journalled so [`Model::abort`] restores the exact prior state.
#[derive(Debug)]
pub struct Model {
    schema: Arc<Schema>,
    options: ModelOptions,
    entities: Vec<EntityRecord>,
    labels: BTreeMap<EntityLabel, EntityId>,
    /// target -> (holder -> number of references from holder to target)
    referrers: FxHashMap<EntityId, BTreeMap<EntityId, u32>>,
    tx_counter: u64,
    open: Option<OpenTx>,
}

impl Model {
    /// Creates an empty model with default options.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_options(schema, ModelOptions::default())
    }

    /// Creates an empty model.
    pub fn with_options(schema: Arc<Schema>, options: ModelOptions) -> Self {
        Self {
            schema,
            options,
            entities: Vec::new(),
            labels: BTreeMap::new(),
            referrers: FxHashMap::default(),
            tx_counter: 0,
            open: None,
        }
    }

    /// Schema the model conforms to.
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The schema seen through the metadata seam.
    pub fn metadata(&self) -> &dyn MetadataProvider {
        self.schema.as_ref()
    }

    /// Store options.
    pub const fn options(&self) -> ModelOptions {
        self.options
    }

    // ── transactions ────────────────────────────────────────────────

    /// Opens a transaction.
    ///
    /// # Errors
    /// [`ModelError::TransactionAlreadyOpen`] if one is already open.
    pub fn begin(&mut self, label: &str) -> Result<TxId, ModelError> {
        if let Some(open) = &self.open {
            return Err(ModelError::TransactionAlreadyOpen(open.id));
        }
        self.tx_counter = self.tx_counter.wrapping_add(1);
        if self.tx_counter == 0 {
            self.tx_counter = 1;
        }
        let id = TxId::from_raw(self.tx_counter);
        self.open = Some(OpenTx {
            id,
            label: label.to_owned(),
            journal: Vec::new(),
            touched: BTreeSet::new(),
        });
        debug!(%id, label, "transaction opened");
        Ok(id)
    }

    /// The open transaction, if any.
    pub fn active_tx(&self) -> Option<TxId> {
        self.open.as_ref().map(|open| open.id)
    }

    /// Returns `true` if `tx` is the open transaction.
    pub fn is_active(&self, tx: TxId) -> bool {
        tx.value() != 0 && self.active_tx() == Some(tx)
    }

    /// Commits the open transaction.
    ///
    /// With [`ModelOptions::enforce_required`] set, every entity touched by
    /// the transaction must have all non-optional attributes set; otherwise
    /// the transaction is rolled back and
    /// [`ModelError::ConstraintViolation`] is returned.
    pub fn commit(&mut self, tx: TxId) -> Result<CommitSummary, ModelError> {
        let open = self.take_tx(tx)?;
        if self.options.enforce_required {
            if let Some(violation) = self.first_unset_required(&open.touched) {
                self.rollback(open.journal)?;
                return Err(violation);
            }
        }
        let created = open
            .journal
            .iter()
            .filter(|entry| matches!(entry, JournalEntry::Created(_)))
            .count();
        let summary = CommitSummary {
            tx: open.id,
            label: open.label,
            created,
            assignments: open.journal.len() - created,
        };
        info!(
            tx = %summary.tx,
            label = %summary.label,
            created = summary.created,
            assignments = summary.assignments,
            "transaction committed"
        );
        Ok(summary)
    }

    /// Rolls back the open transaction.
    pub fn abort(&mut self, tx: TxId) -> Result<(), ModelError> {
        let open = self.take_tx(tx)?;
        let undone = open.journal.len();
        self.rollback(open.journal)?;
        info!(tx = %open.id, label = %open.label, undone, "transaction aborted");
        Ok(())
    }

    fn take_tx(&mut self, tx: TxId) -> Result<OpenTx, ModelError> {
        if !self.is_active(tx) {
            return Err(ModelError::UnknownTx(tx));
        }
        self.open.take().ok_or(ModelError::UnknownTx(tx))
    }

    fn rollback(&mut self, journal: Vec<JournalEntry>) -> Result<(), ModelError> {
        for entry in journal.into_iter().rev() {
            match entry {
                JournalEntry::Assigned {
                    entity,
                    slot,
                    previous,
                } => {
                    self.write_slot(entity, slot, previous)?;
                }
                JournalEntry::Created(id) => {
                    if id.index() + 1 != self.entities.len() {
                        return Err(ModelError::InternalCorruption(
                            "rollback out of creation order",
                        ));
                    }
                    if let Some(record) = self.entities.pop() {
                        let refs: Vec<_> =
                            record.values.iter().flat_map(Value::entity_refs).collect();
                        self.unlink(id, &refs);
                        self.labels.remove(&record.label);
                        self.referrers.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    fn first_unset_required(&self, touched: &BTreeSet<EntityId>) -> Option<ModelError> {
        touched.iter().find_map(|id| {
            let record = self.entities.get(id.index())?;
            let props = self.schema.properties_of(&record.ty)?;
            props
                .iter()
                .filter(|p| p.is_forward() && !p.is_optional())
                .find(|p| {
                    p.slot()
                        .and_then(|slot| record.values.get(slot))
                        .is_some_and(Value::is_unset)
                })
                .map(|p| ModelError::ConstraintViolation {
                    label: record.label,
                    type_name: record.ty.clone(),
                    property: p.name().to_owned(),
                })
        })
    }

    fn journal(&mut self) -> Result<&mut OpenTx, ModelError> {
        self.open.as_mut().ok_or(ModelError::NoActiveTransaction)
    }

    // ── mutation ────────────────────────────────────────────────────

    /// Creates an entity of `ty` with every attribute unset and the next
    /// free label.
    pub fn create_entity(&mut self, ty: &TypeName) -> Result<EntityId, ModelError> {
        let first = self.options.first_label.max(1);
        let next = match self.labels.last_key_value() {
            Some((last, _)) => last
                .value()
                .checked_add(1)
                .ok_or(ModelError::CapacityExceeded)?
                .max(first),
            None => first,
        };
        self.insert_entity(ty, EntityLabel::from_raw(next))
    }

    /// Creates an entity of `ty` carrying `label`.
    pub fn create_entity_with_label(
        &mut self,
        ty: &TypeName,
        label: EntityLabel,
    ) -> Result<EntityId, ModelError> {
        if label.value() == 0 {
            return Err(ModelError::InvalidLabel);
        }
        if self.labels.contains_key(&label) {
            return Err(ModelError::DuplicateLabel(label));
        }
        self.insert_entity(ty, label)
    }

    fn insert_entity(&mut self, ty: &TypeName, label: EntityLabel) -> Result<EntityId, ModelError> {
        self.journal()?;
        if self.schema.entity_def(ty).is_none() {
            return Err(ModelError::UnknownType(ty.clone()));
        }
        if self.schema.is_abstract(ty) {
            return Err(ModelError::AbstractType(ty.clone()));
        }
        let slots = self
            .schema
            .forward_count(ty)
            .ok_or_else(|| ModelError::UnknownType(ty.clone()))?;
        let id = EntityId::from_index(self.entities.len()).ok_or(ModelError::CapacityExceeded)?;
        self.entities.push(EntityRecord {
            label,
            ty: ty.clone(),
            values: vec![Value::Unset; slots],
        });
        self.labels.insert(label, id);
        let open = self.journal()?;
        open.journal.push(JournalEntry::Created(id));
        open.touched.insert(id);
        Ok(id)
    }

    /// Writes the forward attribute at `slot` of `entity`.
    ///
    /// Every reference in `value` must name an entity of this model.
    pub fn set_value_at(
        &mut self,
        entity: EntityId,
        slot: usize,
        value: Value,
    ) -> Result<(), ModelError> {
        self.journal()?;
        if let Some(missing) = value
            .entity_refs()
            .into_iter()
            .find(|r| self.entities.get(r.index()).is_none())
        {
            return Err(ModelError::UnknownEntity(missing));
        }
        let previous = self.write_slot(entity, slot, value)?;
        let open = self.journal()?;
        open.journal.push(JournalEntry::Assigned {
            entity,
            slot,
            previous,
        });
        open.touched.insert(entity);
        Ok(())
    }

    /// Writes the attribute called `name` of `entity`.
    pub fn set_value(&mut self, entity: EntityId, name: &str, value: Value) -> Result<(), ModelError> {
        let schema = Arc::clone(&self.schema);
        let type_name = self.entity(entity)?.ty.clone();
        let descriptor =
            schema
                .property(&type_name, name)
                .ok_or_else(|| ModelError::UnknownProperty {
                    type_name: type_name.clone(),
                    property: name.to_owned(),
                })?;
        descriptor.set(self, entity, value)
    }

    /// Unjournalled slot write; keeps the reverse index in step.
    fn write_slot(
        &mut self,
        entity: EntityId,
        slot: usize,
        value: Value,
    ) -> Result<Value, ModelError> {
        let record = self
            .entities
            .get_mut(entity.index())
            .ok_or(ModelError::UnknownEntity(entity))?;
        let len = record.values.len();
        let cell = record
            .values
            .get_mut(slot)
            .ok_or(ModelError::SlotOutOfRange { entity, slot, len })?;
        let added = value.entity_refs();
        let previous = std::mem::replace(cell, value);
        self.unlink(entity, &previous.entity_refs());
        self.link(entity, &added);
        Ok(previous)
    }

    fn link(&mut self, holder: EntityId, targets: &[EntityId]) {
        for target in targets {
            *self
                .referrers
                .entry(*target)
                .or_default()
                .entry(holder)
                .or_insert(0) += 1;
        }
    }

    fn unlink(&mut self, holder: EntityId, targets: &[EntityId]) {
        for target in targets {
            let Some(holders) = self.referrers.get_mut(target) else {
                continue;
            };
            if let Some(count) = holders.get_mut(&holder) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    holders.remove(&holder);
                }
            }
            if holders.is_empty() {
                self.referrers.remove(target);
            }
        }
    }

    // ── queries ─────────────────────────────────────────────────────

    /// Stored record of `id`.
    pub fn entity(&self, id: EntityId) -> Result<&EntityRecord, ModelError> {
        self.entities
            .get(id.index())
            .ok_or(ModelError::UnknownEntity(id))
    }

    /// Read view of `id`.
    pub fn view(&self, id: EntityId) -> Result<EntityView<'_>, ModelError> {
        let record = self.entity(id)?;
        Ok(EntityView {
            model: self,
            id,
            record,
        })
    }

    /// Type of `id`, if it exists.
    pub fn type_of(&self, id: EntityId) -> Option<&TypeName> {
        self.entities.get(id.index()).map(|r| &r.ty)
    }

    /// Label of `id`, if it exists.
    pub fn label_of(&self, id: EntityId) -> Option<EntityLabel> {
        self.entities.get(id.index()).map(|r| r.label)
    }

    /// Entity carrying `label`.
    pub fn by_label(&self, label: EntityLabel) -> Option<EntityId> {
        self.labels.get(&label).copied()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the model holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> + '_ {
        self.labels
            .values()
            .filter_map(|id| self.entities.get(id.index()).map(|r| (*id, r)))
    }

    /// Instances of `ty` or any subtype, in ascending label order.
    pub fn instances_of<'a>(&'a self, ty: &'a TypeName) -> impl Iterator<Item = EntityId> + 'a {
        self.iter()
            .filter(move |(_, record)| self.schema.is_subtype_of(&record.ty, ty))
            .map(|(id, _)| id)
    }

    /// Entities holding at least one forward reference to `id`, in
    /// ascending handle order.
    pub fn referrers(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.referrers
            .get(&id)
            .into_iter()
            .flat_map(|holders| holders.keys().copied())
    }

    /// Raw slot value of `entity`.
    pub fn value_at(&self, entity: EntityId, slot: usize) -> Result<&Value, ModelError> {
        let record = self.entity(entity)?;
        record.values.get(slot).ok_or(ModelError::SlotOutOfRange {
            entity,
            slot,
            len: record.values.len(),
        })
    }

    /// Value of the property called `name` (forward or inverse).
    pub fn value(&self, entity: EntityId, name: &str) -> Result<Value, ModelError> {
        let type_name = &self.entity(entity)?.ty;
        let descriptor =
            self.schema
                .property(type_name, name)
                .ok_or_else(|| ModelError::UnknownProperty {
                    type_name: type_name.clone(),
                    property: name.to_owned(),
                })?;
        descriptor.get(self, entity)
    }
}

/// Borrowed read view of one entity, handed to filters.
#[derive(Clone, Copy, Debug)]
pub struct EntityView<'a> {
    model: &'a Model,
    id: EntityId,
    record: &'a EntityRecord,
}

impl<'a> EntityView<'a> {
    /// Handle of the entity.
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// `#n` label.
    pub const fn label(&self) -> EntityLabel {
        self.record.label
    }

    /// Concrete type.
    pub const fn type_name(&self) -> &'a TypeName {
        &self.record.ty
    }

    /// Stored record.
    pub const fn record(&self) -> &'a EntityRecord {
        self.record
    }

    /// Owning model.
    pub const fn model(&self) -> &'a Model {
        self.model
    }

    /// Returns `true` if the entity is an instance of `ty` or a subtype.
    pub fn is_a(&self, ty: &str) -> bool {
        self.is_a_type(&TypeName::new(ty))
    }

    /// [`EntityView::is_a`] for an already normalised name.
    pub fn is_a_type(&self, ty: &TypeName) -> bool {
        self.model.schema.is_subtype_of(&self.record.ty, ty)
    }

    /// Value of the property called `name`.
    pub fn value(&self, name: &str) -> Result<Value, ModelError> {
        self.model.value(self.id, name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::schema::{AttributeType, EntityDef, SchemaBuilder};

    fn schema() -> Arc<Schema> {
        Arc::new(
            SchemaBuilder::new("TEST")
                .entity(EntityDef::new("BASE").abstract_type())
                .entity(
                    EntityDef::new("NODE")
                        .supertype("BASE")
                        .attribute("Name", AttributeType::Text)
                        .optional("Next", AttributeType::Entity(TypeName::new("NODE")))
                        .inverse("Prev", "NODE", "Next"),
                )
                .build()
                .unwrap(),
        )
    }

    fn node() -> TypeName {
        TypeName::new("NODE")
    }

    #[test]
    fn mutations_require_an_open_transaction() {
        let mut model = Model::new(schema());
        assert_eq!(
            model.create_entity(&node()),
            Err(ModelError::NoActiveTransaction)
        );
    }

    #[test]
    fn begin_rejects_a_second_open_transaction() {
        let mut model = Model::new(schema());
        let tx = model.begin("first").unwrap();
        assert_eq!(
            model.begin("second"),
            Err(ModelError::TransactionAlreadyOpen(tx))
        );
    }

    #[test]
    fn zero_and_stale_tx_ids_are_unknown() {
        let mut model = Model::new(schema());
        assert_eq!(
            model.commit(TxId::from_raw(0)),
            Err(ModelError::UnknownTx(TxId::from_raw(0)))
        );
        let tx = model.begin("t").unwrap();
        model.commit(tx).unwrap();
        assert_eq!(model.commit(tx), Err(ModelError::UnknownTx(tx)));
    }

    #[test]
    fn labels_are_sequential_from_first_label() {
        let options = ModelOptions {
            first_label: 100,
            ..ModelOptions::default()
        };
        let mut model = Model::with_options(schema(), options);
        let tx = model.begin("t").unwrap();
        let a = model.create_entity(&node()).unwrap();
        let b = model.create_entity(&node()).unwrap();
        model.commit(tx).unwrap();
        assert_eq!(model.label_of(a), Some(EntityLabel::from_raw(100)));
        assert_eq!(model.label_of(b), Some(EntityLabel::from_raw(101)));
    }

    #[test]
    fn abstract_and_unknown_types_cannot_be_created() {
        let mut model = Model::new(schema());
        model.begin("t").unwrap();
        assert_eq!(
            model.create_entity(&TypeName::new("BASE")),
            Err(ModelError::AbstractType(TypeName::new("BASE")))
        );
        assert_eq!(
            model.create_entity(&TypeName::new("NOPE")),
            Err(ModelError::UnknownType(TypeName::new("NOPE")))
        );
    }

    #[test]
    fn abort_restores_entities_labels_and_reverse_index() {
        let mut model = Model::new(schema());
        let tx = model.begin("seed").unwrap();
        let a = model.create_entity(&node()).unwrap();
        model.set_value(a, "Name", Value::from("a")).unwrap();
        model.commit(tx).unwrap();

        let tx = model.begin("discard").unwrap();
        let b = model.create_entity(&node()).unwrap();
        model.set_value(b, "Next", Value::Ref(a)).unwrap();
        model.set_value(a, "Name", Value::from("changed")).unwrap();
        assert_eq!(model.referrers(a).collect::<Vec<_>>(), vec![b]);
        model.abort(tx).unwrap();

        assert_eq!(model.len(), 1);
        assert_eq!(model.by_label(EntityLabel::from_raw(2)), None);
        assert_eq!(model.value(a, "Name").unwrap(), Value::from("a"));
        assert_eq!(model.referrers(a).count(), 0);
    }

    #[test]
    fn inverse_values_follow_the_reverse_index() {
        let mut model = Model::new(schema());
        let tx = model.begin("t").unwrap();
        let a = model.create_entity(&node()).unwrap();
        let b = model.create_entity(&node()).unwrap();
        let c = model.create_entity(&node()).unwrap();
        model.set_value(b, "Next", Value::Ref(a)).unwrap();
        model.set_value(c, "Next", Value::Ref(a)).unwrap();
        model.commit(tx).unwrap();
        assert_eq!(
            model.value(a, "Prev").unwrap(),
            Value::List(vec![Value::Ref(b), Value::Ref(c)])
        );
    }

    #[test]
    fn inverse_properties_are_read_only() {
        let mut model = Model::new(schema());
        model.begin("t").unwrap();
        let a = model.create_entity(&node()).unwrap();
        assert!(matches!(
            model.set_value(a, "Prev", Value::List(Vec::new())),
            Err(ModelError::ReadOnlyProperty { .. })
        ));
    }

    #[test]
    fn references_must_resolve_inside_the_model() {
        let mut model = Model::new(schema());
        model.begin("t").unwrap();
        let a = model.create_entity(&node()).unwrap();
        let ghost = EntityId::from_raw(42);
        assert_eq!(
            model.set_value(a, "Next", Value::Ref(ghost)),
            Err(ModelError::UnknownEntity(ghost))
        );
    }

    #[test]
    fn enforced_commit_rolls_back_on_unset_required_attribute() {
        let options = ModelOptions {
            enforce_required: true,
            ..ModelOptions::default()
        };
        let mut model = Model::with_options(schema(), options);
        let tx = model.begin("t").unwrap();
        model.create_entity(&node()).unwrap();
        let err = model.commit(tx).unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation { ref property, .. } if property == "Name"));
        assert!(model.is_empty());
        assert_eq!(model.active_tx(), None);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let mut model = Model::new(schema());
        model.begin("t").unwrap();
        let label = EntityLabel::from_raw(7);
        model.create_entity_with_label(&node(), label).unwrap();
        assert_eq!(
            model.create_entity_with_label(&node(), label),
            Err(ModelError::DuplicateLabel(label))
        );
        assert_eq!(
            model.create_entity_with_label(&node(), EntityLabel::from_raw(0)),
            Err(ModelError::InvalidLabel)
        );
        let next = model.create_entity(&node()).unwrap();
        assert_eq!(model.label_of(next), Some(EntityLabel::from_raw(8)));
    }
}
