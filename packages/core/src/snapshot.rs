//! Snapshots and the copy-on-write store core.
//!
//! The committed store is an immutable [`Snapshot`]. A commit clones
//! the current map, lets a mutation run against the working copy, and
//! swaps the snapshot reference only if the mutation succeeded. Readers
//! holding an earlier snapshot keep seeing the old, unmodified value -
//! a published snapshot is never mutated in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::cloner::Cloner;
use crate::error::Error;
use crate::value::TopicValue;

/// The full mapping of topic id to topic value at one instant.
pub type StoreMap = BTreeMap<String, TopicValue>;

/// An immutable view of the store at one instant.
///
/// Cloning a snapshot is cheap (reference-counted); the underlying map
/// is shared and never mutated after publication.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    inner: Arc<StoreMap>,
}

impl Snapshot {
    /// Look up a topic by id.
    pub fn topic(&self, id: &str) -> Option<&TopicValue> {
        self.inner.get(id)
    }

    /// Whether a topic is present.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store holds no topics.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate topics in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TopicValue)> {
        self.inner.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &StoreMap {
        &self.inner
    }

    /// Whether two snapshots are the same published instant (reference
    /// identity, not structural equality).
    pub fn ptr_eq(a: &Snapshot, b: &Snapshot) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl From<StoreMap> for Snapshot {
    fn from(map: StoreMap) -> Self {
        Snapshot {
            inner: Arc::new(map),
        }
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.as_ref().serialize(serializer)
    }
}

/// The copy-on-write store core.
///
/// Holds the current committed snapshot and implements the commit
/// primitive all lifecycle operations go through.
#[derive(Debug, Default)]
pub struct StoreCore {
    current: Snapshot,
}

impl StoreCore {
    pub fn new(initial: StoreMap) -> Self {
        StoreCore {
            current: Snapshot::from(initial),
        }
    }

    /// The current committed snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    /// Run a mutation against an isolated copy of the current snapshot
    /// and publish the result.
    ///
    /// The working copy is produced by `cloner`, so the mutation can
    /// freely rearrange it. If the mutation returns an error the copy
    /// is discarded and the committed snapshot is untouched; otherwise
    /// the copy becomes the new committed snapshot in one reference
    /// swap - no intermediate state is observable.
    pub fn commit<T, F>(&mut self, cloner: &dyn Cloner, mutate: F) -> Result<T, Error>
    where
        F: FnOnce(&mut StoreMap) -> Result<T, Error>,
    {
        let mut working = cloner.clone_store(self.current.as_map());
        let out = mutate(&mut working)?;
        self.current = Snapshot::from(working);
        Ok(out)
    }

    /// Swap the committed snapshot reference directly, bypassing the
    /// copy-on-write path. Reserved for state that was already
    /// committed elsewhere (persisted blobs, cross-context payloads).
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.current = snapshot;
    }
}
