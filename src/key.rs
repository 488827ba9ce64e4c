//! Byte-sequence keys, used both as ordered-map keys and as composable
//! path elements.

use std::fmt;

use uuid::Uuid;

/// Reserved byte used to join composed key segments.
pub const SEPARATOR: u8 = 0x00;

/// A byte sequence used both as an ordered-map key and as a composable
/// path element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: Vec<u8>) -> Key {
        Key(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Join this key with additional keys, separated by [`SEPARATOR`].
    pub fn with_keys(&self, rest: &[Key]) -> Key {
        let mut all = vec![self.clone()];
        all.extend_from_slice(rest);
        join(&all)
    }
}

/// `join(a,b,c) = a || 0x00 || b || 0x00 || c`. An empty join yields an
/// empty key.
pub fn join(keys: &[Key]) -> Key {
    let mut buf = Vec::new();
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            buf.push(SEPARATOR);
        }
        buf.extend_from_slice(k.as_bytes());
    }
    Key(buf)
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Key {
        Key(bytes)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Key {
        Key(bytes.to_vec())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Key {
        Key(s.as_bytes().to_vec())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Mint a fresh, unique 128-bit row identifier.
///
/// This is the external identity-generation helper spec.md assumes is
/// supplied by the caller; it is kept as a free function rather than
/// baked into [`crate::table::Table::insert`] so callers can still
/// supply their own keys.
pub fn new_row_key() -> Key {
    Key(Uuid::new_v4().as_bytes().to_vec())
}
