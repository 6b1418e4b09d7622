//! Traversal: `next`/`inext` and a borrowing iterator.
//!
//! Order is fixed: array part by ascending index, then the hash part
//! bucket by bucket, each chain front to back. Resuming from a key finds
//! its position directly (array index, or its chain link, live or
//! tombstoned), so deleting the current key between two `next` calls is
//! safe. Inserting new keys mid-traversal may rehash and is not.

use crate::error::{Result, TableError};
use crate::hash_part::ChainPos;
use crate::table::Table;
use crate::value::LuaValue;
use core::hash::BuildHasher;

#[derive(Copy, Clone, Debug)]
enum Cursor {
    /// Next array position to inspect (1-based).
    Array(usize),
    Hash(ChainPos),
}

impl<V: LuaValue, S: BuildHasher> Table<V, S> {
    fn scan(&self, mut cursor: Cursor) -> Option<(Cursor, V, V)> {
        loop {
            match cursor {
                Cursor::Array(pos) => match self.array.next_present(pos) {
                    Some((p, value)) => {
                        return Some((Cursor::Array(p + 1), V::from_integer(p as i64), value))
                    }
                    None => cursor = Cursor::Hash(ChainPos::Bucket(0)),
                },
                Cursor::Hash(pos) => {
                    let slot = self.hash.resolve_pos(pos)?;
                    let after = Cursor::Hash(self.hash.successor(slot));
                    if let Some((key, value)) = self.hash.entry(slot).resolve() {
                        return Some((after, key, value));
                    }
                    cursor = after;
                }
            }
        }
    }

    fn cursor_after(&self, key: &V) -> Result<Cursor> {
        if key.is_nil() {
            return Ok(Cursor::Array(1));
        }
        if let Some(pos) = self.array_slot(key) {
            return Ok(Cursor::Array(pos + 1));
        }
        if key.is_nan() || self.hash.capacity() == 0 {
            return Err(TableError::InvalidNextKey);
        }
        let lookup = match key.as_integer() {
            Some(i) => V::from_integer(i),
            None => key.clone(),
        };
        match self.hash.find(self.hash_of(&lookup), &lookup) {
            Some(slot) => Ok(Cursor::Hash(self.hash.successor(slot))),
            None => Err(TableError::InvalidNextKey),
        }
    }

    /// Generic traversal step. `next(nil)` yields the first pair; passing
    /// back the previous key yields the following one; `Ok(None)` ends the
    /// traversal. A key that is not in the table (and was not deleted from
    /// it since the traversal started) is an error.
    pub fn next(&self, key: &V) -> Result<Option<(V, V)>> {
        let cursor = self.cursor_after(key)?;
        Ok(self.scan(cursor).map(|(_, k, v)| (k, v)))
    }

    /// Ordinal traversal step: returns `(key + 1, t[key + 1])` while that
    /// value is present. Nil starts at 1.
    pub fn inext(&self, key: &V) -> Result<Option<(V, V)>> {
        let i = if key.is_nil() {
            0
        } else {
            key.as_integer().ok_or(TableError::InvalidNextKey)?
        };
        let Some(n) = i.checked_add(1) else {
            return Ok(None);
        };
        Ok(self.get_int(n).map(|v| (V::from_integer(n), v)))
    }

    pub fn iter(&self) -> Iter<'_, V, S> {
        Iter {
            table: self,
            cursor: Some(Cursor::Array(1)),
        }
    }
}

/// Borrowing iterator over live `(key, value)` pairs, in `next` order.
pub struct Iter<'a, V: LuaValue, S> {
    table: &'a Table<V, S>,
    cursor: Option<Cursor>,
}

impl<'a, V: LuaValue, S: BuildHasher> Iterator for Iter<'a, V, S> {
    type Item = (V, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (cursor, key, value) = self.table.scan(self.cursor?)?;
        self.cursor = Some(cursor);
        Some((key, value))
    }
}

impl<'a, V: LuaValue, S: BuildHasher> IntoIterator for &'a Table<V, S> {
    type Item = (V, V);
    type IntoIter = Iter<'a, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
