//! Relations, rows and selectors: the projection layer between a
//! table's storage form and the secondary indexes built over it.

use crate::column::{self, Column, Offset};
use crate::error::{Error, Result};
use crate::value::Value;

/// An ordered sequence of Values: a projected (sub)row, and the input
/// to an index's selector.
pub type Relation = Vec<Value>;

/// The storage form of a [`Relation`]: an entry in a table's row
/// store, positional per the table's schema.
pub type Row = Vec<Value>;

/// A pure function from [`Row`] to [`Relation`].
pub type Selector = Box<dyn Fn(&Row) -> Relation + Send + Sync>;

/// Resolve column names to offsets against a table's schema, failing
/// on the first unknown name.
pub fn offsets_for(columns: &[Column], names: &[column::Name]) -> Result<Vec<Offset>> {
    let named = column::named_offsets(columns);
    names
        .iter()
        .map(|n| {
            named
                .get(n)
                .copied()
                .ok_or_else(|| Error::ColumnNotFound(n.clone()))
        })
        .collect()
}

/// Build a [`Selector`] that projects a row onto the given column
/// names.
pub fn named_selector(columns: &[Column], names: &[column::Name]) -> Result<Selector> {
    let offsets = offsets_for(columns, names)?;
    Ok(offset_selector(offsets))
}

/// Build a [`Selector`] from pre-resolved offsets.
pub fn offset_selector(offsets: Vec<Offset>) -> Selector {
    Box::new(move |row: &Row| offsets.iter().map(|&o| row[o].clone()).collect())
}

/// Retrieve the entire row as a relation, unchanged.
pub fn star_selector() -> Selector {
    Box::new(|row: &Row| row.clone())
}
