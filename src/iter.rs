//! Prefix-bounded iteration: lazy, restartable cursors over a
//! transaction's snapshot, plus the two higher-order traversal
//! primitives (`for_each`, `take_while`) higher layers use instead of
//! hand-rolled loops over the raw map cursor.

use std::ops::Bound;

use crate::key::Key;
use crate::map::{Cursor, Snapshot};

/// Produced by [`crate::txn::Transaction::ascending`] /
/// [`crate::txn::Transaction::descending`]: a prefix bound to a
/// direction, from which a [`SpecIter`] can be opened either over the
/// whole prefix or from a sub-key.
pub(crate) struct Iterable<V: Clone> {
    snapshot: Snapshot<V>,
    prefix: Vec<u8>,
    rev: bool,
}

impl<V: Clone> Iterable<V> {
    pub(crate) fn new(snapshot: Snapshot<V>, prefix: Vec<u8>, rev: bool) -> Iterable<V> {
        Iterable {
            snapshot,
            prefix,
            rev,
        }
    }

    /// Iterate every entry under this prefix.
    pub(crate) fn all(&self) -> SpecIter<V> {
        if self.rev {
            // Supremum of the prefix's key space: the boundary with its
            // last byte incremented, not the boundary with a byte
            // appended (that would exclude every sub-key starting above
            // 0x01, i.e. almost everything).
            let mut upper = self.prefix.clone();
            let last = upper.len() - 1;
            upper[last] += 1;
            self.open(Bound::Excluded(upper))
        } else {
            self.open(Bound::Included(self.prefix.clone()))
        }
    }

    /// Forward: first entry >= `sub_key`. Reverse: last entry <=
    /// `sub_key`.
    pub(crate) fn from(&self, sub_key: &[u8]) -> SpecIter<V> {
        let mut seek = self.prefix.clone();
        seek.extend_from_slice(sub_key);
        self.open(Bound::Included(seek))
    }

    fn open(&self, bound: Bound<Vec<u8>>) -> SpecIter<V> {
        let cursor = match &bound {
            Bound::Included(k) => {
                if self.rev {
                    Cursor::backward(&self.snapshot, Bound::Included(k.as_slice()))
                } else {
                    Cursor::forward(&self.snapshot, Bound::Included(k.as_slice()))
                }
            }
            Bound::Excluded(k) => {
                if self.rev {
                    Cursor::backward(&self.snapshot, Bound::Excluded(k.as_slice()))
                } else {
                    Cursor::forward(&self.snapshot, Bound::Excluded(k.as_slice()))
                }
            }
            Bound::Unbounded => {
                if self.rev {
                    Cursor::backward(&self.snapshot, Bound::Unbounded)
                } else {
                    Cursor::forward(&self.snapshot, Bound::Unbounded)
                }
            }
        };
        SpecIter {
            cursor,
            prefix_len: self.prefix.len(),
            prefix: self.prefix.clone(),
        }
    }
}

/// A lazy, prefix-bounded cursor. Emitted keys have the owning
/// prefix (and its separator byte) stripped, so consumers see the
/// original user-facing sub-keys. Restartable in the sense spec.md
/// describes: each `pull` consumes the current position and, while
/// more remains, hands back the next position as `continuation`.
pub(crate) struct SpecIter<V: Clone> {
    cursor: Cursor<V>,
    prefix: Vec<u8>,
    prefix_len: usize,
}

/// One pulled tuple: `(key, value, continuation, more)`. When `more`
/// is `false` the other fields are `None`.
pub(crate) type Pulled<V> = (Option<Key>, Option<V>, Option<SpecIter<V>>, bool);

impl<V: Clone> SpecIter<V> {
    /// Pull the next entry, stopping once the physical key no longer
    /// shares this iterator's prefix.
    pub(crate) fn pull(mut self) -> Pulled<V> {
        match self.cursor.next() {
            Some((k, v)) if k.starts_with(&self.prefix) => {
                let sub_key = Key::new(k[self.prefix_len..].to_vec());
                (Some(sub_key), Some(v), Some(self), true)
            }
            _ => (None, None, None, false),
        }
    }
}

impl<V: Clone> Iterator for SpecIter<V> {
    type Item = (Key, V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next() {
            Some((k, v)) if k.starts_with(&self.prefix) => {
                Some((Key::new(k[self.prefix_len..].to_vec()), v))
            }
            _ => None,
        }
    }
}

/// Pulls `iter` until exhaustion or until `reporter` returns an
/// error, returning the first error observed, if any.
pub(crate) fn for_each<V, F, E>(iter: SpecIter<V>, mut reporter: F) -> Result<(), E>
where
    V: Clone,
    F: FnMut(&Key, &V) -> Result<(), E>,
{
    for (k, v) in iter {
        reporter(&k, &v)?;
    }
    Ok(())
}
