// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Source-to-destination identity map.
use std::collections::BTreeMap;

use crate::copier::CopyError;
use crate::ident::EntityId;

/// Records which destination entity each copied source entity became.
///
/// The map is the only memory of what has been copied: a source entity with
/// an entry is never copied again, so sharing one map across several
/// [`crate::copy_entity`] calls deduplicates shared subgraphs. Entries are
/// never overwritten or evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: BTreeMap<EntityId, EntityId>,
}

impl IdentityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination handle previously registered for `source`.
    pub fn lookup(&self, source: EntityId) -> Option<EntityId> {
        self.entries.get(&source).copied()
    }

    /// Records `source -> destination`.
    ///
    /// Registering the same pair twice is a no-op.
    ///
    /// # Errors
    /// [`CopyError::IdentityConflict`] if `source` already maps elsewhere.
    pub fn register(&mut self, source: EntityId, destination: EntityId) -> Result<(), CopyError> {
        match self.entries.get(&source) {
            Some(existing) if *existing == destination => Ok(()),
            Some(existing) => Err(CopyError::IdentityConflict {
                entity: source,
                existing: *existing,
                attempted: destination,
            }),
            None => {
                self.entries.insert(source, destination);
                Ok(())
            }
        }
    }

    /// Number of mapped source entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(source, destination)` pairs in ascending source order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.entries.iter().map(|(s, d)| (*s, *d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> EntityId {
        EntityId::from_raw(n)
    }

    #[test]
    fn register_never_overwrites() {
        let mut map = IdentityMap::new();
        assert_eq!(map.register(id(1), id(10)), Ok(()));
        assert_eq!(map.register(id(1), id(10)), Ok(()));
        assert_eq!(
            map.register(id(1), id(11)),
            Err(CopyError::IdentityConflict {
                entity: id(1),
                existing: id(10),
                attempted: id(11),
            })
        );
        assert_eq!(map.lookup(id(1)), Some(id(10)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn iteration_is_in_source_order() {
        let mut map = IdentityMap::new();
        for (s, d) in [(5, 1), (2, 2), (9, 3)] {
            assert!(map.register(id(s), id(d)).is_ok());
        }
        let sources: Vec<_> = map.iter().map(|(s, _)| s.value()).collect();
        assert_eq!(sources, vec![2, 5, 9]);
        assert!(map.lookup(id(3)).is_none());
    }
}
