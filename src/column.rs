//! Table columns: named positional slots.

use std::collections::HashMap;

pub type Name = String;
pub type Offset = usize;
pub type NamedOffsets = HashMap<Name, Offset>;

/// A named positional slot in a table's row schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: Name,
}

impl Column {
    pub fn new<S: Into<Name>>(name: S) -> Column {
        Column { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: Into<Name>> From<S> for Column {
    fn from(name: S) -> Column {
        Column::new(name)
    }
}

/// Build a name-to-offset mapping from an ordered list of columns.
pub fn named_offsets(columns: &[Column]) -> NamedOffsets {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name().to_string(), i))
        .collect()
}
