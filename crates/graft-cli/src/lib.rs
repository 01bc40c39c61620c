// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! graft command-line harness.
//!
//! ```text
//! graft copy <SOURCE> --schema <FILE> --out <FILE> (--root-type <T> | --label <N>...)
//! graft compare <INSERTED> <ORIGINAL> [--ignore <T>]...
//! graft inspect <FILE> --schema <FILE>
//! ```
//!
//! Exits non-zero when a command fails or a comparison finds differences.
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;

pub use cli::{entrypoint, run, Cli, Commands};
