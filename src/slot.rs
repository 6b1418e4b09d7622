//! Slots: the nodes of a hash-bucket chain.
//!
//! A chain is a singly linked list threaded through a `SlotMap` arena by
//! generational keys, so no slot is ever owned by two buckets and no
//! reference cycles exist. Each [`Link`] carries its precomputed hash; the
//! key's hash function is never called again after insertion.

use crate::mode::WeakMode;
use crate::value::LuaValue;

slotmap::new_key_type! {
    /// Arena index of one chain link.
    pub(crate) struct SlotKey;
}

/// One chain node: an entry, its stored hash, and the rest of the chain.
pub(crate) struct Link<V: LuaValue> {
    pub entry: Entry<V>,
    pub hash: u64,
    pub next: Option<SlotKey>,
}

/// The key a tombstone remembers. Reference-like keys are only kept
/// through a weak handle so a deleted binding never pins its key.
pub(crate) enum DeadKey<V: LuaValue> {
    Strong(V),
    Weak(V::Weak),
}

impl<V: LuaValue> DeadKey<V> {
    pub fn for_key(key: V) -> Self {
        match key.downgrade() {
            Some(weak) => DeadKey::Weak(weak),
            None => DeadKey::Strong(key),
        }
    }

    pub fn matches(&self, q: &V) -> bool {
        match self {
            DeadKey::Strong(k) => k.raw_eq(q),
            DeadKey::Weak(w) => V::upgrade(w).is_some_and(|k| k.raw_eq(q)),
        }
    }

    /// Whether some caller could still present this key to `next`.
    pub fn is_reachable(&self) -> bool {
        match self {
            DeadKey::Strong(_) => true,
            DeadKey::Weak(w) => V::upgrade(w).is_some(),
        }
    }
}

/// Slot payload. Which live variant is used is decided once, at insert
/// time, from the table's [`WeakMode`] and whether each side of the
/// binding is reference-like.
pub(crate) enum Entry<V: LuaValue> {
    Live { key: V, value: V },
    WeakKey { key: V::Weak, value: V },
    WeakValue { key: V, value: V::Weak },
    WeakPair { key: V::Weak, value: V::Weak },
    Tombstone { key: DeadKey<V> },
}

/// What survives of an entry when chains are rebuilt.
pub(crate) enum Relinked<V: LuaValue> {
    Live(V, V),
    Dead(DeadKey<V>),
}

impl<V: LuaValue> Entry<V> {
    pub fn new(key: V, value: V, mode: WeakMode) -> Self {
        let weak_key = if mode.keys { key.downgrade() } else { None };
        let weak_value = if mode.values { value.downgrade() } else { None };
        match (weak_key, weak_value) {
            (None, None) => Entry::Live { key, value },
            (Some(key), None) => Entry::WeakKey { key, value },
            (None, Some(value)) => Entry::WeakValue { key, value },
            (Some(key), Some(value)) => Entry::WeakPair { key, value },
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Entry::Tombstone { .. })
    }

    /// Raw key comparison; tombstones match too so traversal can resume
    /// from a deleted key. An expired weak key matches nothing.
    pub fn matches(&self, q: &V) -> bool {
        match self {
            Entry::Live { key, .. } | Entry::WeakValue { key, .. } => key.raw_eq(q),
            Entry::WeakKey { key, .. } | Entry::WeakPair { key, .. } => {
                V::upgrade(key).is_some_and(|k| k.raw_eq(q))
            }
            Entry::Tombstone { key } => key.matches(q),
        }
    }

    /// Both sides of a live binding, or `None` if the entry is a tombstone
    /// or either weak handle has expired.
    pub fn resolve(&self) -> Option<(V, V)> {
        match self {
            Entry::Live { key, value } => Some((key.clone(), value.clone())),
            Entry::WeakKey { key, value } => Some((V::upgrade(key)?, value.clone())),
            Entry::WeakValue { key, value } => Some((key.clone(), V::upgrade(value)?)),
            Entry::WeakPair { key, value } => Some((V::upgrade(key)?, V::upgrade(value)?)),
            Entry::Tombstone { .. } => None,
        }
    }

    pub fn value(&self) -> Option<V> {
        match self {
            Entry::Live { value, .. } => Some(value.clone()),
            Entry::WeakKey { key, value } => V::upgrade(key).map(|_| value.clone()),
            Entry::WeakValue { value, .. } => V::upgrade(value),
            Entry::WeakPair { key, value } => {
                V::upgrade(key)?;
                V::upgrade(value)
            }
            Entry::Tombstone { .. } => None,
        }
    }

    /// Key of a live binding, without touching the value side beyond the
    /// expiry check.
    pub fn live_key(&self) -> Option<V> {
        match self {
            Entry::Live { key, .. } => Some(key.clone()),
            Entry::WeakKey { key, .. } => V::upgrade(key),
            Entry::WeakValue { key, value } => V::upgrade(value).map(|_| key.clone()),
            Entry::WeakPair { key, value } => {
                V::upgrade(value)?;
                V::upgrade(key)
            }
            Entry::Tombstone { .. } => None,
        }
    }

    /// A non-tombstone whose weak side has been reclaimed.
    pub fn is_expired(&self) -> bool {
        !self.is_tombstone() && self.live_key().is_none()
    }

    /// A tombstone nobody can resume from any more.
    pub fn is_unreachable_tombstone(&self) -> bool {
        match self {
            Entry::Tombstone { key } => !key.is_reachable(),
            _ => false,
        }
    }

    fn dead_key(&self) -> DeadKey<V> {
        match self {
            Entry::Live { key, .. } | Entry::WeakValue { key, .. } => DeadKey::for_key(key.clone()),
            Entry::WeakKey { key, .. } | Entry::WeakPair { key, .. } => DeadKey::Weak(key.clone()),
            Entry::Tombstone { key } => match key {
                DeadKey::Strong(k) => DeadKey::Strong(k.clone()),
                DeadKey::Weak(w) => DeadKey::Weak(w.clone()),
            },
        }
    }

    /// Replace the binding by a tombstone carrying the same key. Returns the
    /// value that was live, if any.
    pub fn kill(&mut self) -> Option<V> {
        if self.is_tombstone() {
            return None;
        }
        let value = self.value();
        *self = Entry::Tombstone {
            key: self.dead_key(),
        };
        value
    }

    /// Decide what a rehash keeps. Live bindings come back as plain pairs,
    /// to be re-encoded for the table's current mode. Tombstones and
    /// expired entries survive only when `keep_tombstones` is set (a mode
    /// change, which may happen mid-traversal) and their key is still
    /// reachable. Growth comes from inserting a new key, which already ends
    /// any valid traversal, so it keeps no tombstones at all.
    pub fn relink(self, keep_tombstones: bool) -> Option<Relinked<V>> {
        if let Some((key, value)) = self.resolve() {
            return Some(Relinked::Live(key, value));
        }
        if !keep_tombstones {
            return None;
        }
        let key = self.dead_key();
        key.is_reachable().then_some(Relinked::Dead(key))
    }
}
