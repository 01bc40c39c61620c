// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! graft-core: schema-driven selective replication of typed entity graphs.
//!
//! A [`Model`] holds entities conforming to a [`Schema`]. [`copy_entity`]
//! copies the subgraph reachable from one root into another model inside a
//! destination transaction, consulting a [`PropertyFilter`] per property and
//! recording every copied entity in an [`IdentityMap`]. [`replicate`] wraps
//! the whole thing in a transaction that commits or leaves the destination
//! untouched.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod copier;
mod filter;
mod ident;
mod identity;
mod metadata;
mod model;
mod schema;
mod session;
mod tx;
mod value;

pub use copier::{copy_entity, CopyError, CopyOptions};
pub use filter::{from_fn, CopyAll, FilterOutcome, PropertyFilter, RuleFilter, SuppressRule};
pub use ident::{EntityId, EntityLabel, TypeName};
pub use identity::IdentityMap;
pub use metadata::{InverseLink, MetadataProvider, PropertyAccessor, PropertyDescriptor};
pub use model::{EntityRecord, EntityView, Model, ModelError, ModelOptions};
pub use schema::{
    AttributeDef, AttributeType, EntityDef, InverseDef, Schema, SchemaBuilder, SchemaDef,
    SchemaError,
};
pub use session::{replicate, CopyReport, CopySession, REPLICATE_TX_LABEL};
pub use tx::{CommitSummary, TxId};
pub use value::Value;
