// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for stored settings and the JSON service on top of it.
//!
//! Stores only move bytes; [`ConfigService`] owns the JSON encoding.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::trace;

/// Byte storage addressed by logical keys such as `profile.semantic`.
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures of stores, key validation and profile resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("not found")]
    NotFound,
    /// Key cannot name a stored blob (empty, or contains a path separator).
    #[error("invalid config key: {0:?}")]
    InvalidKey(String),
    /// A profile name is neither stored nor built in.
    #[error("unknown replication profile: {0}")]
    UnknownProfile(String),
    /// Store-level I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure without a better variant.
    #[error("other: {0}")]
    Other(String),
}

/// Rejects keys that could escape a store's namespace.
///
/// Keys are logical names such as `profile.semantic`; they must be non-empty
/// and free of `/`, `\` and `..`.
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
        return Err(ConfigError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

/// Reads and writes serde values as pretty JSON through a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the wrapped store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Decodes the value under `key`; missing and empty blobs are `None`.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        validate_key(key)?;
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) | Err(ConfigError::NotFound) => {
                trace!(key, "no stored value");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(ConfigError::from)
    }

    /// [`load`](Self::load), falling back to `T::default()` when missing.
    pub fn load_or_default<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encodes `value` and stores it under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        validate_key(key)?;
        let encoded = serde_json::to_vec_pretty(value)?;
        trace!(key, bytes = encoded.len(), "storing value");
        self.store.save_raw(key, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_separators_are_rejected() {
        assert!(validate_key("profile.semantic").is_ok());
        assert!(matches!(validate_key(""), Err(ConfigError::InvalidKey(_))));
        assert!(matches!(validate_key("a/b"), Err(ConfigError::InvalidKey(_))));
        assert!(matches!(validate_key("a\\b"), Err(ConfigError::InvalidKey(_))));
        assert!(matches!(validate_key("..x"), Err(ConfigError::InvalidKey(_))));
    }
}
