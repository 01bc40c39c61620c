// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Building schema and the four-walls sample model from `testdata/`.

use std::sync::Arc;

use graft_core::{EntityId, Model, ModelOptions, Schema, SchemaDef, TypeName};

/// JSON declaration of the building schema.
pub const BUILDING_SCHEMA_JSON: &str = include_str!("../../../testdata/building.schema.json");

/// Exchange text of the sample model: a site with one building, one storey,
/// four walls, a floor slab, property sets, a wall type and a space.
pub const SAMPLE_MODEL_TEXT: &str = include_str!("../../../testdata/4walls1floorSite.ifc");

/// Number of entities in [`SAMPLE_MODEL_TEXT`].
pub const SAMPLE_MODEL_LEN: usize = 70;

/// Parses and freezes the building schema.
///
/// # Panics
/// Panics if the shipped JSON does not describe a valid schema.
#[allow(clippy::expect_used)]
pub fn building_schema() -> Arc<Schema> {
    let def: SchemaDef =
        serde_json::from_str(BUILDING_SCHEMA_JSON).expect("building schema JSON should parse");
    Arc::new(def.build().expect("building schema should be consistent"))
}

/// Loads the sample model with default options.
///
/// # Panics
/// Panics if the sample does not load against [`building_schema`].
pub fn sample_model() -> Model {
    sample_model_with(building_schema(), ModelOptions::default())
}

/// Loads the sample model against `schema`.
///
/// # Panics
/// Panics if the sample does not load.
#[allow(clippy::expect_used)]
pub fn sample_model_with(schema: Arc<Schema>, options: ModelOptions) -> Model {
    graft_step::read_model(SAMPLE_MODEL_TEXT, schema, options)
        .expect("sample model should load against the building schema")
}

/// First instance of `ty` (subtypes included) in label order.
pub fn first_instance(model: &Model, ty: &str) -> Option<EntityId> {
    model.instances_of(&TypeName::new(ty)).next()
}
