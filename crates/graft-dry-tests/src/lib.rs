// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for graft crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`building`] - Building schema and the four-walls sample model
//! - [`graphs`] - Node/link schema plus chain, cycle and edge-list builders

pub mod building;
pub mod config;
pub mod graphs;

pub use building::{
    building_schema, first_instance, sample_model, sample_model_with, BUILDING_SCHEMA_JSON,
    SAMPLE_MODEL_LEN, SAMPLE_MODEL_TEXT,
};
pub use config::InMemoryConfigStore;
pub use graphs::{chain, cycle, empty_model, graph, graph_schema, node_only_schema, GraphBuilder};
