// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for graft tools (config, replication profiles).
//! Keeps the CLI and storage adapters thin.

pub mod config;
pub mod profile;

pub use config::{validate_key, ConfigError, ConfigService, ConfigStore};
pub use profile::{profile_key, ProfileService, ReplicationProfile, BUILTIN_PROFILES};
