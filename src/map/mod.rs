//! The ordered-map adapter: a persistent, copy-on-write ordered map
//! over `bytes -> V`, plus the staged, writable transaction view over
//! it that §4.1/§4.3 of the design describe.

mod node;

use std::ops::Bound;
use std::sync::{Arc, Mutex};

use node::Link;

pub(crate) use node::Cursor;

/// A point-in-time, immutable view of the tree, cheap to clone
/// (`Arc` bump) and safe to hold past the transaction that produced
/// it.
pub(crate) type Snapshot<V> = Link<V>;

/// What happened when a [`MapTxn`] tried to publish its staged
/// writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitOutcome {
    Committed,
    /// The transaction made no writes; nothing to publish.
    NoWrites,
    /// The base root this transaction was opened against has since
    /// been advanced by another, concurrently committed transaction.
    RootAdvanced,
}

/// A persistent ordered map over `bytes -> V`. `root` is the only
/// shared, mutable state; every other operation works against an
/// immutable snapshot of it.
pub(crate) struct PersistentMap<V: Clone> {
    root: Mutex<Link<V>>,
}

impl<V: Clone> PersistentMap<V> {
    pub(crate) fn new() -> PersistentMap<V> {
        PersistentMap {
            root: Mutex::new(None),
        }
    }

    /// Open a writable, staged view over the current root.
    pub(crate) fn begin(&self) -> MapTxn<V> {
        let base = self.root.lock().expect("map root lock poisoned").clone();
        MapTxn {
            base: base.clone(),
            working: base,
            dirty: false,
        }
    }

    /// Attempt to publish `txn`'s staged writes. See
    /// [`CommitOutcome`] for the possible results. The internal
    /// exclusive lock around `root` is the fallback path §5 of the
    /// design describes for ordered maps that don't support a
    /// lock-free CAS; `PersistentMap` always takes it, and uses
    /// `Arc::ptr_eq` against the transaction's captured base as the
    /// root-advance detector.
    pub(crate) fn try_commit(&self, txn: &MapTxn<V>) -> CommitOutcome {
        if !txn.dirty {
            return CommitOutcome::NoWrites;
        }
        let mut root = self.root.lock().expect("map root lock poisoned");
        let unchanged = match (root.as_ref(), txn.base.as_ref()) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        if !unchanged {
            return CommitOutcome::RootAdvanced;
        }
        *root = txn.working.clone();
        CommitOutcome::Committed
    }
}

/// A staged, writable view over one snapshot of a [`PersistentMap`].
/// Writes are buffered in `working`, invisible to any other
/// transaction, until [`PersistentMap::try_commit`] publishes them.
pub(crate) struct MapTxn<V: Clone> {
    base: Link<V>,
    working: Link<V>,
    dirty: bool,
}

impl<V: Clone> MapTxn<V> {
    pub(crate) fn get(&self, key: &[u8]) -> Option<V> {
        node::get(&self.working, key)
    }

    pub(crate) fn insert(&mut self, key: &[u8], value: V) -> (Option<V>, bool) {
        let (new_root, old) = node::insert(self.working.take(), key, value);
        self.working = new_root;
        self.dirty = true;
        let existed = old.is_some();
        (old, existed)
    }

    pub(crate) fn delete(&mut self, key: &[u8]) -> (Option<V>, bool) {
        let (new_root, old) = node::delete(self.working.take(), key);
        self.working = new_root;
        let existed = old.is_some();
        if existed {
            self.dirty = true;
        }
        (old, existed)
    }

    /// Delete every entry whose physical key starts with `prefix`.
    /// Returns whether anything was removed.
    pub(crate) fn delete_prefix(&mut self, prefix: &[u8]) -> bool {
        let mut removed_any = false;
        loop {
            let next = Cursor::forward(&self.working, Bound::Included(prefix)).next();
            match next {
                Some((k, _)) if k.starts_with(prefix) => {
                    let (new_root, _old) = node::delete(self.working.take(), &k);
                    self.working = new_root;
                    removed_any = true;
                }
                _ => break,
            }
        }
        if removed_any {
            self.dirty = true;
        }
        removed_any
    }

    pub(crate) fn cursor_forward(&self, bound: Bound<&[u8]>) -> Cursor<V> {
        Cursor::forward(&self.working, bound)
    }

    pub(crate) fn cursor_backward(&self, bound: Bound<&[u8]>) -> Cursor<V> {
        Cursor::backward(&self.working, bound)
    }

    /// A cheap, shareable snapshot of the currently staged tree, for
    /// building prefix-bounded iterators that outlive a borrow of
    /// this transaction.
    pub(crate) fn snapshot(&self) -> Snapshot<V> {
        self.working.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_with_no_writes_reports_no_writes() {
        let map: PersistentMap<i32> = PersistentMap::new();
        let txn = map.begin();
        assert_eq!(map.try_commit(&txn), CommitOutcome::NoWrites);
    }

    #[test]
    fn commit_publishes_writes_visible_to_later_transactions() {
        let map: PersistentMap<i32> = PersistentMap::new();
        let mut txn = map.begin();
        txn.insert(b"a", 1);
        assert_eq!(map.try_commit(&txn), CommitOutcome::Committed);

        let txn2 = map.begin();
        assert_eq!(txn2.get(b"a"), Some(1));
    }

    #[test]
    fn concurrent_commit_is_detected_as_root_advanced() {
        let map: PersistentMap<i32> = PersistentMap::new();
        let mut txn_a = map.begin();
        let mut txn_b = map.begin();

        txn_a.insert(b"a", 1);
        assert_eq!(map.try_commit(&txn_a), CommitOutcome::Committed);

        txn_b.insert(b"b", 2);
        assert_eq!(map.try_commit(&txn_b), CommitOutcome::RootAdvanced);
    }

    #[test]
    fn discarded_transaction_leaves_root_untouched() {
        let map: PersistentMap<i32> = PersistentMap::new();
        let mut txn = map.begin();
        txn.insert(b"a", 1);
        drop(txn); // discard without committing

        let txn2 = map.begin();
        assert_eq!(txn2.get(b"a"), None);
    }

    #[test]
    fn delete_prefix_removes_only_matching_entries() {
        let map: PersistentMap<i32> = PersistentMap::new();
        let mut txn = map.begin();
        txn.insert(b"\x00\x00\x00\x01\x00a", 1);
        txn.insert(b"\x00\x00\x00\x01\x00b", 2);
        txn.insert(b"\x00\x00\x00\x02\x00a", 3);
        assert!(txn.delete_prefix(b"\x00\x00\x00\x01\x00"));
        assert_eq!(txn.get(b"\x00\x00\x00\x01\x00a"), None);
        assert_eq!(txn.get(b"\x00\x00\x00\x01\x00b"), None);
        assert_eq!(txn.get(b"\x00\x00\x00\x02\x00a"), Some(3));
    }
}
