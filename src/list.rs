//! Sequence helpers over positions `1..=length()`: the operations the
//! table library builds its list functions on.

use crate::error::{Result, TableError};
use crate::table::Table;
use crate::value::LuaValue;
use core::hash::BuildHasher;

/// Upper bound on values produced by a single `unpack`.
pub const MAX_UNPACK: i64 = 1_000_000;

impl<V: LuaValue, S: BuildHasher> Table<V, S> {
    fn at(&self, pos: i64) -> V {
        self.get_int(pos).unwrap_or_else(V::nil)
    }

    /// Append at `length() + 1`.
    pub fn push(&mut self, value: V) -> Result<()> {
        let n = self.length();
        let pos = n
            .checked_add(1)
            .ok_or(TableError::PositionOutOfBounds { position: n })?;
        self.set_int(pos, value)
    }

    /// Insert at `pos`, shifting `pos..=length()` up by one.
    pub fn insert_at(&mut self, pos: i64, value: V) -> Result<()> {
        let e = self.length().saturating_add(1);
        if pos < 1 || pos > e {
            return Err(TableError::PositionOutOfBounds { position: pos });
        }
        let mut i = e;
        while i > pos {
            let v = self.at(i - 1);
            self.set_int(i, v)?;
            i -= 1;
        }
        self.set_int(pos, value)
    }

    /// Remove at `pos` (default `length()`), shifting the tail down.
    /// Positions other than `length()` must be in `1..=length() + 1`.
    pub fn remove_at(&mut self, pos: Option<i64>) -> Result<Option<V>> {
        let size = self.length();
        let mut pos = pos.unwrap_or(size);
        if pos != size && (pos < 1 || pos > size.saturating_add(1)) {
            return Err(TableError::PositionOutOfBounds { position: pos });
        }
        let removed = self.get_int(pos);
        while pos < size {
            let v = self.at(pos + 1);
            self.set_int(pos, v)?;
            pos += 1;
        }
        self.remove(&V::from_integer(pos));
        Ok(removed)
    }

    /// Join `t[i..=j]` (defaults `1` and `length()`) with `sep`. Every
    /// element must be a string or a number.
    pub fn concat(&self, sep: &str, i: Option<i64>, j: Option<i64>) -> Result<String> {
        let i = i.unwrap_or(1);
        let j = j.unwrap_or_else(|| self.length());
        let mut out = String::new();
        let mut k = i;
        while k <= j {
            let ok = self
                .get_int(k)
                .is_some_and(|v| v.write_concat(&mut out));
            if !ok {
                return Err(TableError::InvalidConcatValue { index: k });
            }
            if k == j {
                break;
            }
            out.push_str(sep);
            k += 1;
        }
        Ok(out)
    }

    /// `t[i..=j]` as a list (defaults `1` and `length()`); holes come back
    /// as `None`.
    pub fn unpack(&self, i: Option<i64>, j: Option<i64>) -> Result<Vec<Option<V>>> {
        let i = i.unwrap_or(1);
        let j = j.unwrap_or_else(|| self.length());
        if i > j {
            return Ok(Vec::new());
        }
        let n = i128::from(j) - i128::from(i) + 1;
        if n > i128::from(MAX_UNPACK) {
            return Err(TableError::TooManyResults);
        }
        Ok((i..=j).map(|k| self.get_int(k)).collect())
    }

    /// Sort `1..=length()` in place by the values' primitive ordering.
    pub fn sort(&mut self) -> Result<()> {
        self.sort_by(|a, b| a.raw_lt(b).ok_or(TableError::Incomparable))
    }

    /// Sort `1..=length()` in place with a less-than predicate. The first
    /// error from `lt` aborts the sort and leaves the table untouched. An
    /// inconsistent predicate yields some permutation, never a panic.
    pub fn sort_by<F>(&mut self, mut lt: F) -> Result<()>
    where
        F: FnMut(&V, &V) -> Result<bool>,
    {
        let n = self.length();
        if n < 2 {
            return Ok(());
        }
        let mut items: Vec<V> = (1..=n).map(|k| self.at(k)).collect();
        merge_sort(&mut items, &mut lt)?;
        for (k, v) in (1..=n).zip(items) {
            self.set_int(k, v)?;
        }
        Ok(())
    }

    /// Copy `t[f..=e]` to `t[t..]` within this table, handling overlap.
    pub fn move_range(&mut self, f: i64, e: i64, t: i64) -> Result<()> {
        let Some(n) = move_len(f, e, t)? else {
            return Ok(());
        };
        if t > e || t <= f {
            for i in 0..n {
                let v = self.at(f + i);
                self.set_int(t + i, v)?;
            }
        } else {
            for i in (0..n).rev() {
                let v = self.at(f + i);
                self.set_int(t + i, v)?;
            }
        }
        Ok(())
    }

    /// Copy `self[f..=e]` to `dest[t..]`.
    pub fn copy_range_to<S2: BuildHasher>(
        &self,
        f: i64,
        e: i64,
        t: i64,
        dest: &mut Table<V, S2>,
    ) -> Result<()> {
        let Some(n) = move_len(f, e, t)? else {
            return Ok(());
        };
        for i in 0..n {
            dest.set_int(t + i, self.at(f + i))?;
        }
        Ok(())
    }

    /// Largest positive numeric key, or 0. Scans the whole table; kept for
    /// compatibility with the legacy `maxn`.
    pub fn maxn(&self) -> f64 {
        self.iter()
            .filter_map(|(k, _)| k.as_number())
            .fold(0.0, f64::max)
    }
}

/// Element count for a move of `f..=e` to `t`, or `None` if empty.
fn move_len(f: i64, e: i64, t: i64) -> Result<Option<i64>> {
    if e < f {
        return Ok(None);
    }
    if !(f > 0 || e < i64::MAX + f) {
        return Err(TableError::TooManyElementsToMove);
    }
    let n = e - f + 1;
    if t > i64::MAX - n + 1 {
        return Err(TableError::DestinationWrapAround);
    }
    Ok(Some(n))
}

/// Bottom-up stable merge sort with a fallible predicate.
fn merge_sort<V: Clone, F>(items: &mut Vec<V>, lt: &mut F) -> Result<()>
where
    F: FnMut(&V, &V) -> Result<bool>,
{
    let n = items.len();
    let mut buf: Vec<V> = Vec::with_capacity(n);
    let mut width = 1;
    while width < n {
        buf.clear();
        let mut start = 0;
        while start < n {
            let mid = (start + width).min(n);
            let end = (start + 2 * width).min(n);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if lt(&items[j], &items[i])? {
                    buf.push(items[j].clone());
                    j += 1;
                } else {
                    buf.push(items[i].clone());
                    i += 1;
                }
            }
            buf.extend_from_slice(&items[i..mid]);
            buf.extend_from_slice(&items[j..end]);
            start = end;
        }
        std::mem::swap(items, &mut buf);
        width *= 2;
    }
    Ok(())
}
