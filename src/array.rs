//! Array part: dense storage for keys `1..=len`.

use crate::error::{Result, TableError};
use crate::value::LuaValue;

/// One array cell. Weak-valued tables store reference-like values through
/// their weak handle; expired cells read as absent.
pub(crate) enum Stored<V: LuaValue> {
    Empty,
    Strong(V),
    Weak(V::Weak),
}

impl<V: LuaValue> Stored<V> {
    /// Store hook shared by plain and weak-valued tables.
    pub fn wrap(value: V, weak_values: bool) -> Self {
        if weak_values {
            if let Some(w) = value.downgrade() {
                return Stored::Weak(w);
            }
        }
        Stored::Strong(value)
    }

    pub fn resolve(&self) -> Option<V> {
        match self {
            Stored::Empty => None,
            Stored::Strong(v) => Some(v.clone()),
            Stored::Weak(w) => V::upgrade(w),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            Stored::Empty => false,
            Stored::Strong(_) => true,
            Stored::Weak(w) => V::upgrade(w).is_some(),
        }
    }
}

pub(crate) struct ArrayPart<V: LuaValue> {
    cells: Vec<Stored<V>>,
}

impl<V: LuaValue> ArrayPart<V> {
    pub fn with_len(len: usize) -> Self {
        Self {
            cells: std::iter::repeat_with(|| Stored::Empty).take(len).collect(),
        }
    }

    /// Like `with_len`, but reports a refused allocation instead of
    /// aborting.
    pub fn try_with_len(len: usize) -> Result<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| TableError::TableOverflow)?;
        cells.extend(std::iter::repeat_with(|| Stored::Empty).take(len));
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `pos` is 1-based and must be within `1..=len`.
    pub fn get(&self, pos: usize) -> Option<V> {
        self.cells[pos - 1].resolve()
    }

    /// Out-of-range positions read as absent.
    pub fn is_present(&self, pos: usize) -> bool {
        pos >= 1 && self.cells.get(pos - 1).is_some_and(Stored::is_present)
    }

    pub fn store(&mut self, pos: usize, value: V, weak_values: bool) {
        self.cells[pos - 1] = Stored::wrap(value, weak_values);
    }

    /// Punch a hole; the array never shrinks here.
    pub fn clear(&mut self, pos: usize) -> Option<V> {
        std::mem::replace(&mut self.cells[pos - 1], Stored::Empty).resolve()
    }

    /// First present position at or after `from`, with its value.
    pub fn next_present(&self, from: usize) -> Option<(usize, V)> {
        let start = from.max(1);
        self.cells
            .iter()
            .enumerate()
            .skip(start - 1)
            .find_map(|(i, cell)| cell.resolve().map(|v| (i + 1, v)))
    }

    pub fn take_cells(&mut self) -> Vec<Stored<V>> {
        std::mem::take(&mut self.cells)
    }

    /// Null out cells whose weak value expired. Returns how many.
    pub fn clear_expired(&mut self) -> usize {
        let mut cleared = 0;
        for cell in &mut self.cells {
            if matches!(cell, Stored::Weak(_)) && !cell.is_present() {
                *cell = Stored::Empty;
                cleared += 1;
            }
        }
        cleared
    }
}
