// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Transaction identifiers and commit summaries.

use std::fmt;

/// Identifier of a model transaction.
///
/// # Invariants
/// - Issued by [`crate::Model::begin`] in increasing order; the counter wraps
///   at `u64::MAX` and resumes at `1`.
/// - Zero is never issued. Zero, stale and foreign ids are all rejected with
///   [`crate::ModelError::UnknownTx`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TxId(u64);

impl TxId {
    /// Wraps a raw value. Intended for tooling and tests.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// What a committed transaction changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Committed transaction.
    pub tx: TxId,
    /// Label passed to [`crate::Model::begin`].
    pub label: String,
    /// Entities created by the transaction.
    pub created: usize,
    /// Attribute writes journalled by the transaction.
    pub assignments: usize,
}
