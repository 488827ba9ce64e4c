//! Secondary indexes: unique and standard key formation, and the
//! mutation protocol (`insert`/`delete`/`truncate`) maintained over
//! them.

use crate::error::{Error, Result};
use crate::key::{join, Key};
use crate::prefix::Prefix;
use crate::relation::{Relation, Row, Selector};
use crate::stored::StoredValue;
use crate::txn::Transaction;

/// Whether an index rejects a second row that projects to the same
/// relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Index key is `join(selector(row))`; a second insert under the
    /// same projected relation fails.
    Unique,
    /// Index key is `join(selector(row), primary_key)`; every insert
    /// succeeds, and a relation may own many primary keys.
    Standard,
}

/// The physical index key for a given projected relation, before the
/// owning primary key is appended (for [`IndexKind::Standard`]) or
/// withheld (for [`IndexKind::Unique`]).
pub(crate) fn selector_key(relation: &Relation) -> Key {
    let parts: Vec<Key> = relation.iter().map(|v| Key::new(v.bytes())).collect();
    join(&parts)
}

/// Form the full physical index key for one row, per `kind`.
pub(crate) fn entry_key(kind: IndexKind, relation: &Relation, primary_key: &[u8]) -> Key {
    let sel = selector_key(relation);
    match kind {
        IndexKind::Unique => sel,
        IndexKind::Standard => join(&[sel, Key::from(primary_key)]),
    }
}

/// A live index, reconstructed from its descriptor on every open: the
/// prefix it is stored under, whether it enforces uniqueness, and the
/// selector it projects rows through.
pub(crate) struct Index {
    name: String,
    prefix: Prefix,
    kind: IndexKind,
    selector: Selector,
}

impl Index {
    pub(crate) fn new(name: String, prefix: Prefix, kind: IndexKind, selector: Selector) -> Index {
        Index {
            name,
            prefix,
            kind,
            selector,
        }
    }

    fn key_for(&self, row: &Row, primary_key: &[u8]) -> Key {
        let relation = (self.selector)(row);
        entry_key(self.kind, &relation, primary_key)
    }

    pub(crate) fn insert(&self, txn: &mut Transaction, primary_key: &[u8], row: &Row) -> Result<()> {
        let key = self.key_for(row, primary_key);
        if self.kind == IndexKind::Unique && txn.get(self.prefix, key.as_bytes()).is_some() {
            return Err(Error::UniqueConstraintViolation(self.name.clone()));
        }
        txn.insert(self.prefix, key.as_bytes(), StoredValue::Pk(primary_key.to_vec()));
        Ok(())
    }

    pub(crate) fn delete(&self, txn: &mut Transaction, primary_key: &[u8], row: &Row) -> bool {
        let key = self.key_for(row, primary_key);
        txn.delete(self.prefix, key.as_bytes()).1
    }

    pub(crate) fn truncate(&self, txn: &mut Transaction) -> bool {
        txn.drop_prefix(self.prefix)
    }
}
