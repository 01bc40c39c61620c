// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Loads exchange text into a [`Model`].
use std::collections::BTreeMap;
use std::sync::Arc;

use graft_core::{EntityId, EntityLabel, Model, ModelOptions, Schema, TypeName, Value};
use tracing::{debug, warn};

use crate::error::StepError;
use crate::grammar::{parse_exchange, HeaderRecord, Instance, Param};
use crate::header::HeaderInfo;

/// Transaction label used while loading.
pub const LOAD_TX_LABEL: &str = "Load";

/// Parses `text` into a new model conforming to `schema`.
///
/// Entities keep their file labels. Forward references are allowed; they are
/// resolved after every instance has been created.
pub fn read_model(
    text: &str,
    schema: Arc<Schema>,
    options: ModelOptions,
) -> Result<Model, StepError> {
    read_with_header(text, schema, options).map(|(_, model)| model)
}

/// [`read_model`] that also returns the decoded header.
pub fn read_with_header(
    text: &str,
    schema: Arc<Schema>,
    options: ModelOptions,
) -> Result<(HeaderInfo, Model), StepError> {
    let exchange = parse_exchange(text)?;
    let header = decode_header(&exchange.header);
    if let Some(declared) = header.schema.first() {
        if !declared.eq_ignore_ascii_case(schema.name()) {
            warn!(
                file_schema = %declared,
                model_schema = schema.name(),
                "file schema differs from model schema"
            );
        }
    }

    let mut model = Model::with_options(schema, options);
    let tx = model.begin(LOAD_TX_LABEL)?;
    match populate(&mut model, &exchange.instances) {
        Ok(()) => {
            model.commit(tx)?;
            debug!(entities = model.len(), "exchange file loaded");
            Ok((header, model))
        }
        Err(err) => {
            if let Err(abort_err) = model.abort(tx) {
                warn!(error = %abort_err, "abort after failed load did not complete");
            }
            Err(err)
        }
    }
}

fn populate(model: &mut Model, instances: &[Instance]) -> Result<(), StepError> {
    let schema = Arc::clone(model.schema());
    let mut ids: BTreeMap<u64, EntityId> = BTreeMap::new();
    for instance in instances {
        let label = EntityLabel::from_raw(instance.label);
        if ids.contains_key(&instance.label) {
            return Err(StepError::DuplicateLabel {
                line: instance.line,
                label,
            });
        }
        let type_name = TypeName::new(&instance.keyword);
        let Some(expected) = schema.forward_count(&type_name) else {
            return Err(StepError::UnknownType {
                line: instance.line,
                type_name,
            });
        };
        if expected != instance.params.len() {
            return Err(StepError::Arity {
                line: instance.line,
                label,
                type_name,
                expected,
                found: instance.params.len(),
            });
        }
        let id = model.create_entity_with_label(&type_name, label)?;
        ids.insert(instance.label, id);
    }

    for instance in instances {
        let Some(id) = ids.get(&instance.label).copied() else {
            continue;
        };
        for (slot, param) in instance.params.iter().enumerate() {
            let value = resolve(param, &ids, instance.line)?;
            if !value.is_unset() {
                model.set_value_at(id, slot, value)?;
            }
        }
    }
    Ok(())
}

fn resolve(param: &Param, ids: &BTreeMap<u64, EntityId>, line: usize) -> Result<Value, StepError> {
    Ok(match param {
        Param::Unset => Value::Unset,
        Param::Derived => Value::Derived,
        Param::Integer(v) => Value::Integer(*v),
        Param::Real(v) => Value::Real(*v),
        Param::Text(v) => Value::Text(v.clone()),
        Param::Enum(item) => match item.as_str() {
            "T" => Value::Logical(Some(true)),
            "F" => Value::Logical(Some(false)),
            "U" => Value::Logical(None),
            _ => Value::Enum(item.clone()),
        },
        Param::Binary(v) => Value::Binary(v.clone()),
        Param::Ref(label) => {
            let id = ids
                .get(label)
                .copied()
                .ok_or(StepError::DanglingReference {
                    line,
                    label: EntityLabel::from_raw(*label),
                })?;
            Value::Ref(id)
        }
        Param::List(items) => Value::List(
            items
                .iter()
                .map(|item| resolve(item, ids, line))
                .collect::<Result<_, _>>()?,
        ),
        Param::Typed(name, inner) => Value::Typed {
            type_name: TypeName::new(name),
            value: Box::new(resolve(inner, ids, line)?),
        },
    })
}

fn texts(param: Option<&Param>) -> Vec<String> {
    match param {
        Some(Param::Text(text)) => vec![text.clone()],
        Some(Param::List(items)) => items
            .iter()
            .filter_map(|item| match item {
                Param::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_header(records: &[HeaderRecord]) -> HeaderInfo {
    let mut header = HeaderInfo::default();
    for record in records {
        let first = |index: usize| texts(record.params.get(index)).into_iter().next();
        match record.keyword.to_ascii_uppercase().as_str() {
            "FILE_DESCRIPTION" => {
                header.description = texts(record.params.first());
                if let Some(level) = first(1) {
                    header.implementation_level = level;
                }
            }
            "FILE_NAME" => {
                header.file_name = first(0).unwrap_or_default();
                header.time_stamp = first(1).unwrap_or_default();
                header.author = texts(record.params.get(2));
                header.organization = texts(record.params.get(3));
                header.preprocessor_version = first(4).unwrap_or_default();
                header.originating_system = first(5).unwrap_or_default();
                header.authorization = first(6).unwrap_or_default();
            }
            "FILE_SCHEMA" => header.schema = texts(record.params.first()),
            other => debug!(record = other, "ignoring header record"),
        }
    }
    header
}
