// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-root copy sessions and the transactional `replicate` entry point.
use tracing::{info, warn};

use crate::copier::{copy_entity, CopyError, CopyOptions};
use crate::filter::PropertyFilter;
use crate::ident::EntityId;
use crate::identity::IdentityMap;
use crate::model::Model;
use crate::tx::TxId;

/// Transaction label used by [`replicate`].
pub const REPLICATE_TX_LABEL: &str = "Insert copy";

/// Copies several roots into one destination transaction through a shared
/// identity map, so subgraphs reachable from more than one root are copied
/// once.
pub struct CopySession<'a> {
    source: &'a Model,
    destination: &'a mut Model,
    tx: TxId,
    identity: IdentityMap,
    options: CopyOptions,
    filter: &'a dyn PropertyFilter,
}

impl<'a> CopySession<'a> {
    /// Starts a session writing into `destination` under `tx`.
    pub fn new(
        source: &'a Model,
        destination: &'a mut Model,
        tx: TxId,
        options: CopyOptions,
        filter: &'a dyn PropertyFilter,
    ) -> Self {
        Self {
            source,
            destination,
            tx,
            identity: IdentityMap::new(),
            options,
            filter,
        }
    }

    /// Seeds the session with mappings from an earlier copy.
    pub fn with_identity_map(mut self, identity: IdentityMap) -> Self {
        self.identity = identity;
        self
    }

    /// Copies one root; see [`copy_entity`].
    pub fn copy(&mut self, root: EntityId) -> Result<EntityId, CopyError> {
        copy_entity(
            self.source,
            root,
            self.destination,
            self.tx,
            &mut self.identity,
            self.options,
            self.filter,
        )
    }

    /// Copies every root in order, stopping at the first error.
    pub fn copy_all<I>(&mut self, roots: I) -> Result<Vec<EntityId>, CopyError>
    where
        I: IntoIterator<Item = EntityId>,
    {
        roots.into_iter().map(|root| self.copy(root)).collect()
    }

    /// Mappings accumulated so far.
    pub const fn identity_map(&self) -> &IdentityMap {
        &self.identity
    }

    /// Ends the session, keeping its mappings.
    pub fn into_identity_map(self) -> IdentityMap {
        self.identity
    }
}

/// Outcome of a committed [`replicate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Committed destination transaction.
    pub tx: TxId,
    /// Destination handles of the roots, in input order.
    pub roots: Vec<EntityId>,
    /// Entities created in the destination.
    pub created: usize,
    /// Source-to-destination mappings.
    pub identity: IdentityMap,
}

/// Copies `roots` into `destination` inside one transaction.
///
/// Commits when every root copies cleanly. Any failure, including a
/// commit-time constraint violation, leaves `destination` exactly as it was.
pub fn replicate(
    source: &Model,
    destination: &mut Model,
    roots: &[EntityId],
    options: CopyOptions,
    filter: &dyn PropertyFilter,
) -> Result<CopyReport, CopyError> {
    let tx = destination.begin(REPLICATE_TX_LABEL)?;
    let copied = {
        let mut session = CopySession::new(source, destination, tx, options, filter);
        session
            .copy_all(roots.iter().copied())
            .map(|dest_roots| (dest_roots, session.into_identity_map()))
    };
    match copied {
        Ok((dest_roots, identity)) => {
            let summary = destination.commit(tx)?;
            info!(
                %tx,
                roots = dest_roots.len(),
                created = summary.created,
                "replication committed"
            );
            Ok(CopyReport {
                tx,
                roots: dest_roots,
                created: summary.created,
                identity,
            })
        }
        Err(err) => {
            if let Err(abort_err) = destination.abort(tx) {
                warn!(%tx, error = %abort_err, "abort after failed copy did not complete");
            }
            Err(err)
        }
    }
}
