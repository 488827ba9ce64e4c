//! The staged, writable view bound to one user operation: prefix-
//! scoped map access plus the catalog operations (`create_table`,
//! `tables`, `table`) that route every lookup through it.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::iter::Iterable;
use crate::map::MapTxn;
use crate::prefix::{self, Prefix};
use crate::stored::{StoredValue, TableDescriptor};
use crate::table::Table;

/// A staged view over one snapshot of the database, handed to the
/// user's operation function by [`crate::database::Database::transact`].
pub struct Transaction {
    pub(crate) inner: MapTxn<StoredValue>,
}

impl Transaction {
    pub(crate) fn new(inner: MapTxn<StoredValue>) -> Transaction {
        Transaction { inner }
    }

    pub(crate) fn get(&self, prefix: Prefix, key: &[u8]) -> Option<StoredValue> {
        self.inner.get(&prefix.with_key(key))
    }

    pub(crate) fn insert(&mut self, prefix: Prefix, key: &[u8], value: StoredValue) -> (Option<StoredValue>, bool) {
        self.inner.insert(&prefix.with_key(key), value)
    }

    pub(crate) fn delete(&mut self, prefix: Prefix, key: &[u8]) -> (Option<StoredValue>, bool) {
        self.inner.delete(&prefix.with_key(key))
    }

    pub(crate) fn drop_prefix(&mut self, prefix: Prefix) -> bool {
        self.inner.delete_prefix(&prefix.boundary())
    }

    pub(crate) fn ascending(&self, prefix: Prefix) -> Iterable<StoredValue> {
        Iterable::new(self.inner.snapshot(), prefix.boundary(), false)
    }

    pub(crate) fn descending(&self, prefix: Prefix) -> Iterable<StoredValue> {
        Iterable::new(self.inner.snapshot(), prefix.boundary(), true)
    }

    /// Allocate the next prefix, persisting the advanced counter.
    /// Defaults to [`prefix::TABLES`], the last reserved prefix, so the
    /// first dynamically allocated prefix is `TABLES.next()` rather
    /// than colliding with it.
    pub(crate) fn next_prefix(&mut self) -> Prefix {
        let current = match self.get(prefix::START, prefix::SEQUENCE_KEY) {
            Some(v) => v.as_sequence(),
            None => prefix::TABLES,
        };
        let next = current.next();
        self.insert(prefix::START, prefix::SEQUENCE_KEY, StoredValue::Sequence(next));
        next
    }

    /// Create a new, empty table. Fails if the name is already taken.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        if self.get(prefix::TABLES, name.as_bytes()).is_some() {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let indexes_prefix = self.next_prefix();
        let rows_prefix = self.next_prefix();
        let descriptor = TableDescriptor {
            name: name.to_string(),
            columns,
            indexes_prefix,
            rows_prefix,
        };
        self.insert(
            prefix::TABLES,
            name.as_bytes(),
            StoredValue::Table(descriptor),
        );
        Ok(())
    }

    /// Names of every table, ascending.
    pub fn tables(&self) -> Vec<String> {
        self.ascending(prefix::TABLES)
            .all()
            .map(|(k, _)| String::from_utf8_lossy(k.as_bytes()).into_owned())
            .collect()
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<Table> {
        self.get(prefix::TABLES, name.as_bytes())
            .map(|v| Table::new(v.into_table()))
    }
}
