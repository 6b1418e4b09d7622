//! Table: array part + hash part behind one raw get/set surface.

use crate::array::ArrayPart;
use crate::error::{Result, TableError};
use crate::hash_part::HashPart;
use crate::mode::WeakMode;
use crate::sizing::{self, KeyCensus};
use crate::slot::{Entry, Relinked};
use crate::value::{array_index, LuaValue};
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;
use std::borrow::Cow;

/// Hybrid array/hash associative container.
///
/// Positive integer keys up to the array length live in a dense array;
/// every other key lives in a chained hash part. Deleting a hash-resident
/// key leaves a tombstone in its chain so an in-flight traversal can
/// resume from it. All access here is *raw*: metamethod fallback is the
/// caller's business.
///
/// Traversal order depends on the hasher instance. The default builder is
/// seeded per instance, so two tables agree on order only when built from
/// clones of one hasher and fed the same operations.
pub struct Table<V: LuaValue, S = DefaultHashBuilder> {
    pub(crate) array: ArrayPart<V>,
    pub(crate) hash: HashPart<V>,
    mode: WeakMode,
    hasher: S,
}

#[derive(Copy, Clone, Debug)]
enum RehashCause {
    Growth,
    ModeChange,
}

impl<V: LuaValue> Table<V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Pre-size both parts, as a constructor with known field counts would.
    /// Hints are advisory: one that cannot be honoured is ignored.
    pub fn with_capacity(narray: usize, nhash: usize) -> Self {
        Self::with_capacity_and_hasher(narray, nhash, Default::default())
    }

    /// Pre-size both parts, failing with `TableOverflow` for a hint past
    /// the part ceilings or one the allocator refuses.
    pub fn try_with_capacity(narray: usize, nhash: usize) -> Result<Self> {
        Self::try_with_capacity_and_hasher(narray, nhash, Default::default())
    }
}

impl<V: LuaValue> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: LuaValue, S> fmt::Debug for Table<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("array", &self.array.len())
            .field("hash", &self.hash.capacity())
            .field("live_hash", &self.hash.live())
            .field("mode", &self.mode)
            .finish()
    }
}

pub(crate) fn make_hash<V: LuaValue, S: BuildHasher>(hasher: &S, key: &V) -> u64 {
    let mut state = hasher.build_hasher();
    match key.as_integer() {
        Some(i) => i.hash(&mut state),
        None => key.raw_hash(&mut state),
    }
    state.finish()
}

/// Hash-part keys with an integer view are stored in integer form.
fn normalize<V: LuaValue>(key: &V) -> Cow<'_, V> {
    match key.as_integer() {
        Some(i) => Cow::Owned(V::from_integer(i)),
        None => Cow::Borrowed(key),
    }
}

impl<V: LuaValue, S: BuildHasher> Table<V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, 0, hasher)
    }

    pub fn with_capacity_and_hasher(narray: usize, nhash: usize, hasher: S) -> Self {
        let parts = sizing::presize(narray, nhash).and_then(|(asize, hsize)| {
            Ok((ArrayPart::try_with_len(asize)?, HashPart::try_with_capacity(hsize)?))
        });
        let (array, hash) = parts.unwrap_or_else(|err| {
            log::warn!("ignoring capacity hint ({narray}, {nhash}): {err}");
            (ArrayPart::with_len(0), HashPart::with_capacity(0))
        });
        Self::from_parts(array, hash, hasher)
    }

    pub fn try_with_capacity_and_hasher(narray: usize, nhash: usize, hasher: S) -> Result<Self> {
        let (asize, hsize) = sizing::presize(narray, nhash)?;
        Ok(Self::from_parts(
            ArrayPart::try_with_len(asize)?,
            HashPart::try_with_capacity(hsize)?,
            hasher,
        ))
    }

    fn from_parts(array: ArrayPart<V>, hash: HashPart<V>, hasher: S) -> Self {
        Self {
            array,
            hash,
            mode: WeakMode::STRONG,
            hasher,
        }
    }

    pub fn mode(&self) -> WeakMode {
        self.mode
    }

    /// Length of the array part (0 or a power of two).
    pub fn array_capacity(&self) -> usize {
        self.array.len()
    }

    /// Bucket count of the hash part (0 or a power of two).
    pub fn hash_capacity(&self) -> usize {
        self.hash.capacity()
    }

    /// Live bindings in the hash part. Exact for strong tables; weak tables
    /// may overcount entries that expired since the last sweep.
    pub fn hash_len_upper_bound(&self) -> usize {
        self.hash.live()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub(crate) fn hash_of(&self, key: &V) -> u64 {
        make_hash(&self.hasher, key)
    }

    pub(crate) fn array_slot(&self, key: &V) -> Option<usize> {
        array_index(key).filter(|&i| i <= self.array.len())
    }

    /// Raw read. Nil and NaN keys are never present.
    pub fn get(&self, key: &V) -> Option<V> {
        if key.is_nil() || key.is_nan() {
            return None;
        }
        if let Some(i) = self.array_slot(key) {
            return self.array.get(i);
        }
        if self.hash.capacity() == 0 {
            return None;
        }
        let key = normalize(key);
        self.hash.get(self.hash_of(&key), &key)
    }

    pub fn get_int(&self, key: i64) -> Option<V> {
        if let Some(i) = usize::try_from(key)
            .ok()
            .filter(|&i| i >= 1 && i <= self.array.len())
        {
            return self.array.get(i);
        }
        if self.hash.capacity() == 0 {
            return None;
        }
        let key = V::from_integer(key);
        self.hash.get(self.hash_of(&key), &key)
    }

    pub fn contains_key(&self, key: &V) -> bool {
        self.get(key).is_some()
    }

    /// Raw write. A nil `value` removes the binding; a nil or NaN `key` is
    /// rejected.
    pub fn set(&mut self, key: V, value: V) -> Result<()> {
        if key.is_nil() {
            return Err(TableError::NilKey);
        }
        if key.is_nan() {
            return Err(TableError::NaNKey);
        }
        if value.is_nil() {
            self.remove(&key);
            return Ok(());
        }
        if let Some(i) = self.array_slot(&key) {
            self.array.store(i, value, self.mode.values);
            return Ok(());
        }
        let key = match key.as_integer() {
            Some(i) => V::from_integer(i),
            None => key,
        };
        let hash = self.hash_of(&key);
        if let Some(slot) = self.hash.find(hash, &key) {
            self.hash.replace(slot, Entry::new(key, value, self.mode));
            return Ok(());
        }
        if self.hash.is_full() {
            self.rehash(Some(&key), RehashCause::Growth);
            if let Some(i) = self.array_slot(&key) {
                self.array.store(i, value, self.mode.values);
                return Ok(());
            }
        }
        self.hash.push(hash, Entry::new(key, value, self.mode));
        Ok(())
    }

    pub fn set_int(&mut self, key: i64, value: V) -> Result<()> {
        self.set(V::from_integer(key), value)
    }

    /// Remove a binding, returning its value. Array cells become holes;
    /// hash slots become tombstones.
    pub fn remove(&mut self, key: &V) -> Option<V> {
        if key.is_nil() || key.is_nan() {
            return None;
        }
        if let Some(i) = self.array_slot(key) {
            return self.array.clear(i);
        }
        let key = normalize(key);
        let slot = self.hash.find(self.hash_of(&key), &key)?;
        self.hash.kill(slot)
    }

    /// Switch weak mode. Slot representation depends on the mode, so any
    /// change rebuilds both parts.
    pub fn set_mode(&mut self, mode: WeakMode) {
        if mode == self.mode {
            return;
        }
        log::trace!("table mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.rehash(None, RehashCause::ModeChange);
    }

    /// Collector-side sweep: tombstone hash entries and empty array cells
    /// whose weak side has been reclaimed, and unlink tombstones whose key
    /// is itself gone. Returns the number of bindings cleared.
    pub fn clear_expired(&mut self) -> usize {
        if !self.mode.is_weak() {
            let (_, unlinked) = self.hash.clear_expired();
            log::trace!("sweep strong table: {unlinked} dead tombstones unlinked");
            return 0;
        }
        let cells = self.array.clear_expired();
        let (expired, unlinked) = self.hash.clear_expired();
        log::trace!(
            "sweep weak table: {cells} array cells, {expired} hash entries expired, {unlinked} tombstones unlinked"
        );
        cells + expired
    }

    /// Border search: some `n` with `t[n]` present and `t[n+1]` absent, or
    /// 0 when `t[1]` is absent. With holes, any border may be returned.
    pub fn length(&self) -> i64 {
        let asize = self.array.len();
        if asize > 0 && !self.array.is_present(asize) {
            // t[asize] absent: binary search for a border inside the array.
            let (mut i, mut j) = (0usize, asize);
            while j - i > 1 {
                let m = i + (j - i) / 2;
                if self.array.is_present(m) {
                    i = m;
                } else {
                    j = m;
                }
            }
            return i as i64;
        }
        let asize = asize as u64;
        if self.hash.capacity() == 0 || !self.present_u64(asize + 1) {
            return asize as i64;
        }
        self.unbound_search(asize + 1) as i64
    }

    fn present_u64(&self, key: u64) -> bool {
        i64::try_from(key).is_ok_and(|k| self.get_int(k).is_some())
    }

    /// `t[i]` is present; double `j` until `t[j]` is absent, then bisect.
    fn unbound_search(&self, mut i: u64) -> u64 {
        const MAX: u64 = i64::MAX as u64;
        let mut j = i;
        loop {
            if j <= MAX / 2 {
                j *= 2;
            } else {
                j = MAX;
                if !self.present_u64(j) {
                    break;
                }
                // Every index tried up to the maximal integer was present.
                return j;
            }
            if !self.present_u64(j) {
                break;
            }
            i = j;
        }
        while j - i > 1 {
            let m = i + (j - i) / 2;
            if self.present_u64(m) {
                i = m;
            } else {
                j = m;
            }
        }
        i
    }

    fn census(&self, extra: Option<&V>) -> KeyCensus {
        let mut census = KeyCensus::new();
        for pos in 1..=self.array.len() {
            if self.array.is_present(pos) {
                census.count(Some(pos));
            }
        }
        for entry in self.hash.entries() {
            if let Some(key) = entry.live_key() {
                census.count(array_index(&key));
            }
        }
        if let Some(key) = extra {
            census.count(array_index(key));
        }
        census
    }

    /// Rebuild both parts. Growth resizes them from a census of live keys
    /// plus `extra`, the key whose insertion triggered it, and drops every
    /// tombstone. A mode change keeps both sizes and every reachable
    /// tombstone, re-encoding slots in traversal order so an in-flight
    /// traversal resumes exactly where it was.
    fn rehash(&mut self, extra: Option<&V>, cause: RehashCause) {
        let (array_len, in_array) = match cause {
            RehashCause::Growth => {
                let split = self.census(extra).array_split();
                (split.len, split.in_array)
            }
            RehashCause::ModeChange => {
                let len = self.array.len();
                (len, (1..=len).filter(|&p| self.array.is_present(p)).count())
            }
        };

        let old_array = self.array.len();
        let old_hash = self.hash.capacity();
        let old_live = self.hash.live();
        let cells = self.array.take_cells();
        let chains = self.hash.drain();

        let mut array = ArrayPart::with_len(array_len);
        let mut pending: Vec<(u64, Entry<V>)> = Vec::with_capacity(old_live + old_array);
        let mut reclaimed = 0usize;

        // Array tail beyond the new length spills into the hash part.
        for (i, cell) in cells.into_iter().enumerate() {
            let pos = i + 1;
            let Some(value) = cell.resolve() else {
                continue;
            };
            if pos <= array_len {
                array.store(pos, value, self.mode.values);
            } else {
                let key = V::from_integer(pos as i64);
                let hash = make_hash(&self.hasher, &key);
                pending.push((hash, Entry::new(key, value, self.mode)));
            }
        }

        let keep_tombstones = matches!(cause, RehashCause::ModeChange);
        for (hash, entry) in chains {
            match entry.relink(keep_tombstones) {
                Some(Relinked::Live(key, value)) => {
                    match array_index(&key).filter(|&p| p <= array_len) {
                        Some(pos) => array.store(pos, value, self.mode.values),
                        None => pending.push((hash, Entry::new(key, value, self.mode))),
                    }
                }
                Some(Relinked::Dead(key)) => pending.push((hash, Entry::Tombstone { key })),
                None => reclaimed += 1,
            }
        }

        let extra_in_hash = extra
            .map(|k| array_index(k).filter(|&p| p <= array_len).is_none())
            .unwrap_or(false);
        let hash_len = match cause {
            RehashCause::Growth => {
                sizing::hash_capacity(pending.len() + usize::from(extra_in_hash))
            }
            // Nothing was added, so the old bucket count still fits.
            RehashCause::ModeChange => old_hash,
        };
        let mut hash_part = HashPart::with_capacity(hash_len);
        for (hash, entry) in pending {
            hash_part.push(hash, entry);
        }

        self.array = array;
        self.hash = hash_part;
        log::debug!(
            "rehash ({:?}): array {} -> {} ({} keys), hash {} -> {}, {} slots reclaimed",
            cause,
            old_array,
            self.array.len(),
            in_array,
            old_hash,
            self.hash.capacity(),
            reclaimed
        );
    }
}
