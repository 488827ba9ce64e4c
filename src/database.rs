//! The transactional entry point: opens a transaction over the
//! current root, runs the caller's operation against it, and commits
//! or discards depending on the outcome.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::map::{CommitOutcome, PersistentMap};
use crate::stored::StoredValue;
use crate::txn::Transaction;

/// An embedded, in-memory relational store. Cheap to share across
/// threads behind an `Arc`; every operation goes through
/// [`Database::transact`].
pub struct Database {
    map: PersistentMap<StoredValue>,
}

impl Default for Database {
    fn default() -> Database {
        Database::new()
    }
}

impl Database {
    pub fn new() -> Database {
        Database {
            map: PersistentMap::new(),
        }
    }

    /// Run `op` against a transaction over the current root.
    ///
    /// If `op` fails, the staged writes are discarded and the failure
    /// is surfaced unchanged. If `op` succeeds, the transaction is
    /// committed; a root that advanced concurrently is reported as
    /// [`Error::CommitFailed`], and a transaction that made no writes
    /// is treated as a no-op success, per the base root being
    /// preserved either way.
    pub fn transact<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut Transaction) -> Result<R>,
    {
        let mut txn = Transaction::new(self.map.begin());
        let result = op(&mut txn)?;
        match self.map.try_commit(&txn.inner) {
            CommitOutcome::Committed => {
                debug!("transaction committed");
                Ok(result)
            }
            CommitOutcome::NoWrites => Ok(result),
            CommitOutcome::RootAdvanced => {
                warn!("commit failed: base root advanced concurrently");
                Err(Error::CommitFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::value::Value;

    #[test]
    fn create_table_is_visible_after_commit() {
        let db = Database::new();
        db.transact(|txn| txn.create_table("t", vec![Column::new("a"), Column::new("b")]))
            .unwrap();

        db.transact(|txn| {
            assert_eq!(txn.tables(), vec!["t".to_string()]);
            let table = txn.table("t").expect("table should exist");
            assert_eq!(
                table.columns().iter().map(|c| c.name()).collect::<Vec<_>>(),
                vec!["a", "b"]
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_create_table_fails_and_catalog_is_unaffected() {
        let db = Database::new();
        db.transact(|txn| txn.create_table("t", vec![])).unwrap();
        let err = db
            .transact(|txn| txn.create_table("t", vec![]))
            .unwrap_err();
        assert_eq!(err, Error::TableAlreadyExists("t".to_string()));
        db.transact(|txn| {
            assert_eq!(txn.tables(), vec!["t".to_string()]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn failed_operation_discards_all_staged_writes() {
        let db = Database::new();
        db.transact(|txn| txn.create_table("t", vec![Column::new("a")]))
            .unwrap();

        let res: Result<()> = db.transact(|txn| {
            let table = txn.table("t").unwrap();
            table.insert(txn, b"pk1", vec![Value::Integer(1)])?;
            Err(Error::ColumnNotFound("boom".into()))
        });
        assert!(res.is_err());

        db.transact(|txn| {
            let table = txn.table("t").unwrap();
            assert_eq!(table.select(txn, b"pk1"), (None, false));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn no_writes_commits_as_success() {
        let db = Database::new();
        db.transact(|_txn| Ok(())).unwrap();
    }
}
