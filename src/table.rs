//! Table handles: row storage plus the secondary indexes maintained
//! over it.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::index::{Index, IndexKind};
use crate::relation;
use crate::relation::Row;
use crate::stored::{IndexDescriptor, StoredValue, TableDescriptor};
use crate::txn::Transaction;

/// A table's columns, name and storage prefixes, fixed at creation.
pub struct Table {
    descriptor: TableDescriptor,
}

impl Table {
    pub(crate) fn new(descriptor: TableDescriptor) -> Table {
        Table { descriptor }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.descriptor.columns
    }

    /// Names of every index on this table, ascending.
    pub fn indexes(&self, txn: &Transaction) -> Vec<String> {
        txn.ascending(self.descriptor.indexes_prefix)
            .all()
            .map(|(k, _)| String::from_utf8_lossy(k.as_bytes()).into_owned())
            .collect()
    }

    /// Create a secondary index over the named columns.
    pub fn create_index(
        &self,
        txn: &mut Transaction,
        kind: IndexKind,
        name: &str,
        column_names: &[&str],
    ) -> Result<()> {
        if txn
            .get(self.descriptor.indexes_prefix, name.as_bytes())
            .is_some()
        {
            return Err(Error::IndexAlreadyExists(name.to_string()));
        }
        let names: Vec<String> = column_names.iter().map(|s| s.to_string()).collect();
        let column_offsets = relation::offsets_for(&self.descriptor.columns, &names)?;
        let prefix = txn.next_prefix();
        let descriptor = IndexDescriptor {
            name: name.to_string(),
            kind,
            prefix,
            column_offsets,
        };
        txn.insert(
            self.descriptor.indexes_prefix,
            name.as_bytes(),
            StoredValue::Index(descriptor),
        );
        Ok(())
    }

    /// Load every index, ascending by name, as live handles.
    fn open_indexes(&self, txn: &Transaction) -> Vec<Index> {
        txn.ascending(self.descriptor.indexes_prefix)
            .all()
            .map(|(_, v)| {
                let descriptor = v.into_index();
                let selector = relation::offset_selector(descriptor.column_offsets.clone());
                Index::new(descriptor.name, descriptor.prefix, descriptor.kind, selector)
            })
            .collect()
    }

    pub fn insert(&self, txn: &mut Transaction, primary_key: &[u8], row: Row) -> Result<()> {
        if txn
            .get(self.descriptor.rows_prefix, primary_key)
            .is_some()
        {
            return Err(Error::KeyAlreadyExists(hex(primary_key)));
        }
        txn.insert(
            self.descriptor.rows_prefix,
            primary_key,
            StoredValue::Row(row.clone()),
        );
        for index in self.open_indexes(txn) {
            index.insert(txn, primary_key, &row)?;
        }
        Ok(())
    }

    /// Replace the row at `primary_key`, returning the row it
    /// replaced. Every index is updated delete-before-insert so that
    /// replacing a row with an identical projection under a unique
    /// index does not spuriously fail.
    pub fn update(&self, txn: &mut Transaction, primary_key: &[u8], row: Row) -> Result<Row> {
        let old = match txn.get(self.descriptor.rows_prefix, primary_key) {
            Some(v) => v.into_row(),
            None => return Err(Error::KeyNotFound(hex(primary_key))),
        };
        txn.insert(
            self.descriptor.rows_prefix,
            primary_key,
            StoredValue::Row(row.clone()),
        );
        for index in self.open_indexes(txn) {
            index.delete(txn, primary_key, &old);
            index.insert(txn, primary_key, &row)?;
        }
        Ok(old)
    }

    pub fn delete(&self, txn: &mut Transaction, primary_key: &[u8]) -> (Option<Row>, bool) {
        let (old, existed) = txn.delete(self.descriptor.rows_prefix, primary_key);
        if !existed {
            return (None, false);
        }
        let old_row = old.unwrap().into_row();
        for index in self.open_indexes(txn) {
            index.delete(txn, primary_key, &old_row);
        }
        (Some(old_row), true)
    }

    pub fn select(&self, txn: &Transaction, primary_key: &[u8]) -> (Option<Row>, bool) {
        match txn.get(self.descriptor.rows_prefix, primary_key) {
            Some(v) => (Some(v.into_row()), true),
            None => (None, false),
        }
    }

    pub fn truncate(&self, txn: &mut Transaction) {
        for index in self.open_indexes(txn) {
            index.truncate(txn);
        }
        txn.drop_prefix(self.descriptor.rows_prefix);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKind;
    use crate::map::PersistentMap;
    use crate::value::Value;

    fn new_txn() -> Transaction {
        let map: PersistentMap<StoredValue> = PersistentMap::new();
        Transaction::new(map.begin())
    }

    fn make_table(txn: &mut Transaction) -> Table {
        txn.create_table("people", vec![Column::new("id"), Column::new("name")])
            .unwrap();
        txn.table("people").unwrap()
    }

    #[test]
    fn insert_then_select_round_trips() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let row = vec![Value::Integer(1), Value::String("ada".into())];
        table.insert(&mut txn, b"pk1", row.clone()).unwrap();
        let (got, found) = table.select(&txn, b"pk1");
        assert!(found);
        assert_eq!(got, Some(row));
    }

    #[test]
    fn insert_duplicate_key_fails() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let row = vec![Value::Integer(1), Value::String("ada".into())];
        table.insert(&mut txn, b"pk1", row.clone()).unwrap();
        let err = table.insert(&mut txn, b"pk1", row).unwrap_err();
        assert!(matches!(err, Error::KeyAlreadyExists(_)));
    }

    #[test]
    fn update_replaces_row_and_returns_old() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let row1 = vec![Value::Integer(1), Value::String("ada".into())];
        let row2 = vec![Value::Integer(1), Value::String("grace".into())];
        table.insert(&mut txn, b"pk1", row1.clone()).unwrap();
        let old = table.update(&mut txn, b"pk1", row2.clone()).unwrap();
        assert_eq!(old, row1);
        assert_eq!(table.select(&txn, b"pk1"), (Some(row2), true));
    }

    #[test]
    fn update_missing_key_fails() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let err = table
            .update(&mut txn, b"missing", vec![Value::Integer(1)])
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn delete_removes_row_and_reports_existed() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let row = vec![Value::Integer(1), Value::String("ada".into())];
        table.insert(&mut txn, b"pk1", row.clone()).unwrap();
        assert_eq!(table.delete(&mut txn, b"pk1"), (Some(row), true));
        assert_eq!(table.delete(&mut txn, b"pk1"), (None, false));
    }

    #[test]
    fn unique_index_rejects_duplicate_projection() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        table
            .create_index(&mut txn, IndexKind::Unique, "by_id", &["id"])
            .unwrap();
        table
            .insert(
                &mut txn,
                b"pk1",
                vec![Value::Integer(1), Value::String("ada".into())],
            )
            .unwrap();
        let err = table
            .insert(
                &mut txn,
                b"pk2",
                vec![Value::Integer(1), Value::String("grace".into())],
            )
            .unwrap_err();
        assert!(matches!(err, Error::UniqueConstraintViolation(_)));
    }

    #[test]
    fn update_with_unchanged_unique_projection_does_not_spuriously_fail() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        table
            .create_index(&mut txn, IndexKind::Unique, "by_id", &["id"])
            .unwrap();
        table
            .insert(
                &mut txn,
                b"pk1",
                vec![Value::Integer(1), Value::String("ada".into())],
            )
            .unwrap();
        table
            .update(
                &mut txn,
                b"pk1",
                vec![Value::Integer(1), Value::String("lovelace".into())],
            )
            .unwrap();
    }

    #[test]
    fn create_index_on_unknown_column_fails() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        let err = table
            .create_index(&mut txn, IndexKind::Unique, "bad", &["nope"])
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(_)));
    }

    #[test]
    fn truncate_clears_rows_and_indexes() {
        let mut txn = new_txn();
        let table = make_table(&mut txn);
        table
            .create_index(&mut txn, IndexKind::Standard, "by_name", &["name"])
            .unwrap();
        table
            .insert(
                &mut txn,
                b"pk1",
                vec![Value::Integer(1), Value::String("ada".into())],
            )
            .unwrap();
        table.truncate(&mut txn);
        assert_eq!(table.select(&txn, b"pk1"), (None, false));
        assert_eq!(table.indexes(&txn), vec!["by_name".to_string()]);
    }
}
