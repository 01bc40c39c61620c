// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for graft.

use anyhow::Result;
use graft_cli::entrypoint;

fn main() -> Result<()> {
    entrypoint()
}
