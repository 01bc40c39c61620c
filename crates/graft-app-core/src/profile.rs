// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Replication profiles: named, serialisable bundles of copy settings.
//!
//! A profile carries everything one replication run needs besides the models
//! themselves: the copy options, the destination model options, the filter
//! rules, and the entity types the line comparison skips. Profiles are stored
//! through a [`ConfigStore`] under `profile.<name>`; `default` and `semantic`
//! are always available even when nothing is stored.

use graft_core::{CopyOptions, ModelOptions, RuleFilter};
use graft_step::DEFAULT_IGNORED_TYPES;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Names that resolve without any stored configuration.
pub const BUILTIN_PROFILES: [&str; 2] = ["default", "semantic"];

/// Settings for one replication run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationProfile {
    /// Copy the holders of inverse relationships.
    pub copy_inverse_relations: bool,
    /// Follow entity references.
    pub deep: bool,
    /// Reuse source labels in the destination.
    pub keep_labels: bool,
    /// Reject commits that leave required attributes unset.
    pub enforce_required: bool,
    /// Per-property filter rules.
    pub filter: RuleFilter,
    /// Entity types skipped by the line comparison.
    pub ignore_types: Vec<String>,
}

impl Default for ReplicationProfile {
    fn default() -> Self {
        Self {
            copy_inverse_relations: false,
            deep: true,
            keep_labels: true,
            enforce_required: false,
            filter: RuleFilter::default(),
            ignore_types: DEFAULT_IGNORED_TYPES.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

impl ReplicationProfile {
    /// Semantic extraction: no geometry or placement, property sets and
    /// types followed through their inverses.
    pub fn semantic() -> Self {
        Self {
            copy_inverse_relations: true,
            filter: RuleFilter::semantic(),
            ..Self::default()
        }
    }

    /// Built-in profile called `name`.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "semantic" => Some(Self::semantic()),
            _ => None,
        }
    }

    /// Copier options.
    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            copy_inverse_relations: self.copy_inverse_relations,
            deep: self.deep,
            keep_labels: self.keep_labels,
        }
    }

    /// Options for the destination model.
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            enforce_required: self.enforce_required,
            ..ModelOptions::default()
        }
    }

    /// `ignore_types` as borrowed strings, ready for the comparison API.
    pub fn ignore_list(&self) -> Vec<&str> {
        self.ignore_types.iter().map(String::as_str).collect()
    }
}

/// Store key of the profile called `name`.
pub fn profile_key(name: &str) -> String {
    format!("profile.{name}")
}

/// Loads and saves [`ReplicationProfile`]s through a config store.
pub struct ProfileService<S> {
    config: ConfigService<S>,
}

impl<S: ConfigStore> ProfileService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self {
            config: ConfigService::new(store),
        }
    }

    /// Returns the stored profile `name`, else the built-in one.
    ///
    /// # Errors
    /// [`ConfigError::UnknownProfile`] when neither exists; store and
    /// deserialisation failures are passed through.
    pub fn resolve(&self, name: &str) -> Result<ReplicationProfile, ConfigError> {
        if let Some(stored) = self.config.load::<ReplicationProfile>(&profile_key(name))? {
            debug!(profile = name, "using stored replication profile");
            return Ok(stored);
        }
        ReplicationProfile::builtin(name)
            .inspect(|_| debug!(profile = name, "using built-in replication profile"))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))
    }

    /// Stores `profile` under `name`, shadowing a built-in of the same name.
    pub fn save(&self, name: &str, profile: &ReplicationProfile) -> Result<(), ConfigError> {
        self.config.save(&profile_key(name), profile)
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.config.into_inner()
    }
}
