//! Hash part: power-of-two bucket array of slot chains.

use crate::error::{Result, TableError};
use crate::slot::{Entry, Link, SlotKey};
use crate::value::LuaValue;
use slotmap::SlotMap;

#[derive(Copy, Clone, Debug, Default)]
struct Bucket {
    head: Option<SlotKey>,
    tail: Option<SlotKey>,
}

/// Where a chain walk continues: a specific link, or the first link of
/// the first non-empty bucket at or after an index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ChainPos {
    Slot(SlotKey),
    Bucket(usize),
}

pub(crate) struct HashPart<V: LuaValue> {
    slots: SlotMap<SlotKey, Link<V>>,
    buckets: Vec<Bucket>,
    // Non-tombstone links. Exact for strong tables; for weak tables an
    // upper bound, since entries can expire without being touched.
    live: usize,
}

impl<V: LuaValue> HashPart<V> {
    /// `capacity` must be 0 or a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity == 0 || capacity.is_power_of_two());
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            buckets: vec![Bucket::default(); capacity],
            live: 0,
        }
    }

    /// Bucket array for a construction hint. Slots are allocated on
    /// demand; a refused bucket allocation is reported, not aborted on.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        debug_assert!(capacity == 0 || capacity.is_power_of_two());
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|_| TableError::TableOverflow)?;
        buckets.resize(capacity, Bucket::default());
        Ok(Self {
            slots: SlotMap::with_key(),
            buckets,
            live: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn live(&self) -> usize {
        self.live
    }

    /// Load factor 1.0, counting tombstones as occupied.
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    /// Walk the key's chain with raw equality; live entries and tombstones
    /// both match.
    pub fn find(&self, hash: u64, key: &V) -> Option<SlotKey> {
        if self.buckets.is_empty() {
            return None;
        }
        let mut cur = self.buckets[self.bucket_of(hash)].head;
        while let Some(k) = cur {
            let link = &self.slots[k];
            if link.hash == hash && link.entry.matches(key) {
                return Some(k);
            }
            cur = link.next;
        }
        None
    }

    pub fn get(&self, hash: u64, key: &V) -> Option<V> {
        self.find(hash, key).and_then(|k| self.slots[k].entry.value())
    }

    pub fn entry(&self, slot: SlotKey) -> &Entry<V> {
        &self.slots[slot].entry
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry<V>> {
        self.slots.values().map(|link| &link.entry)
    }

    /// Append at the tail of the key's chain so traversal order of existing
    /// links is preserved. The caller guarantees the key is not present.
    pub fn push(&mut self, hash: u64, entry: Entry<V>) -> SlotKey {
        debug_assert!(!self.buckets.is_empty());
        if !entry.is_tombstone() {
            self.live += 1;
        }
        let b = self.bucket_of(hash);
        let k = self.slots.insert(Link {
            entry,
            hash,
            next: None,
        });
        let bucket = &mut self.buckets[b];
        match bucket.tail {
            Some(t) => self.slots[t].next = Some(k),
            None => bucket.head = Some(k),
        }
        bucket.tail = Some(k);
        k
    }

    /// Overwrite a slot in place, reviving it if it was a tombstone.
    pub fn replace(&mut self, slot: SlotKey, entry: Entry<V>) {
        let link = &mut self.slots[slot];
        match (link.entry.is_tombstone(), entry.is_tombstone()) {
            (true, false) => self.live += 1,
            (false, true) => self.live -= 1,
            _ => {}
        }
        link.entry = entry;
    }

    /// Tombstone a slot in place. Returns the value that was live.
    pub fn kill(&mut self, slot: SlotKey) -> Option<V> {
        let entry = &mut self.slots[slot].entry;
        if entry.is_tombstone() {
            return None;
        }
        self.live -= 1;
        entry.kill()
    }

    fn first_from(&self, bucket: usize) -> Option<SlotKey> {
        self.buckets.get(bucket..)?.iter().find_map(|b| b.head)
    }

    pub fn resolve_pos(&self, pos: ChainPos) -> Option<SlotKey> {
        match pos {
            ChainPos::Slot(k) => Some(k),
            ChainPos::Bucket(b) => self.first_from(b),
        }
    }

    /// Position right after `slot` in traversal order.
    pub fn successor(&self, slot: SlotKey) -> ChainPos {
        let link = &self.slots[slot];
        match link.next {
            Some(n) => ChainPos::Slot(n),
            None => ChainPos::Bucket(self.bucket_of(link.hash) + 1),
        }
    }

    /// Take every link out in traversal order, leaving the part empty with
    /// its bucket count unchanged.
    pub fn drain(&mut self) -> Vec<(u64, Entry<V>)> {
        let mut out = Vec::with_capacity(self.slots.len());
        for b in 0..self.buckets.len() {
            let mut cur = self.buckets[b].head.take();
            self.buckets[b].tail = None;
            while let Some(k) = cur {
                if let Some(link) = self.slots.remove(k) {
                    cur = link.next;
                    out.push((link.hash, link.entry));
                } else {
                    cur = None;
                }
            }
        }
        self.live = 0;
        out
    }

    /// Tombstone entries whose weak side expired and unlink tombstones
    /// whose key can no longer be presented to `next`. Returns
    /// `(expired, unlinked)`.
    pub fn clear_expired(&mut self) -> (usize, usize) {
        let mut expired = 0;
        let mut unlinked = 0;
        for b in 0..self.buckets.len() {
            let mut prev: Option<SlotKey> = None;
            let mut cur = self.buckets[b].head;
            while let Some(k) = cur {
                let link = &mut self.slots[k];
                let next = link.next;
                if link.entry.is_expired() {
                    link.entry.kill();
                    self.live -= 1;
                    expired += 1;
                }
                if link.entry.is_unreachable_tombstone() {
                    match prev {
                        Some(p) => self.slots[p].next = next,
                        None => self.buckets[b].head = next,
                    }
                    if self.buckets[b].tail == Some(k) {
                        self.buckets[b].tail = prev;
                    }
                    self.slots.remove(k);
                    unlinked += 1;
                } else {
                    prev = Some(k);
                }
                cur = next;
            }
        }
        (expired, unlinked)
    }
}
