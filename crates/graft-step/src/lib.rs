// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! graft-step: line-oriented exchange text for graft models.
//!
//! Every entity is one line `#<label>=<TYPE>(<fields>);` inside an
//! ISO-10303-21 envelope. [`read_model`] loads such text into a
//! [`graft_core::Model`], [`to_string`] and [`write_model`] write one back,
//! and [`compare_entity_lines`] checks a copy against its source label by
//! label.
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
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions
)]

mod compare;
mod error;
mod grammar;
mod header;
mod reader;
mod writer;

pub use compare::{
    compare_entity_lines, entity_lines, Comparison, LineMismatch, DEFAULT_IGNORED_TYPES,
};
pub use error::StepError;
pub use header::HeaderInfo;
pub use reader::{read_model, read_with_header, LOAD_TX_LABEL};
pub use writer::{entity_line, format_real, to_string, write_model};
