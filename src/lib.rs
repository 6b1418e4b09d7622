//! lua-table: the hybrid array/hash table at the heart of a Lua runtime,
//! with weak tables and traversal that survives deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one associative container that is fast for both sequences and
//!   maps, generic over the runtime's value type.
//! - Layers:
//!   - `LuaValue`: the contract the engine consumes. Raw equality, raw
//!     hashing, an integer view for numeric keys, and weak handles for
//!     reference-like values.
//!   - `ArrayPart`: dense cells for keys `1..=n`, `n` a power of two.
//!   - `HashPart`: power-of-two bucket array of singly linked chains,
//!     threaded through a `slotmap` arena by generational keys.
//!   - `Table<V, S>`: the public surface: raw get/set, border search,
//!     `next`/`inext`, weak modes, and the sequence helpers in `list`.
//!
//! Constraints
//! - Single-threaded; a table is `Send`/`Sync` only if its values are.
//! - Nil and NaN are never keys. Setting a nil value removes.
//! - Keys with an integer view are stored and hashed in integer form, so
//!   `t[3]` and `t[3.0]` are the same slot.
//! - Each link stores its precomputed `u64` hash; key hashing is never
//!   invoked again after insertion.
//!
//! Deletion and traversal
//! - Removing a hash-resident key turns its link into a tombstone in
//!   place. The tombstone keeps its chain position and its key (weakly
//!   for reference-like keys), so `next` can resume from a key that was
//!   deleted after it was returned.
//! - Tombstones count towards the load factor. A growth rehash drops them
//!   all; a mode-change rehash keeps every tombstone whose key is still
//!   reachable, and keeps the layout, so a traversal may resume across it.
//!   A sweep unlinks tombstones whose key is unreachable.
//!
//! Sizing
//! - A rehash happens only when a new key meets a full hash part, or on a
//!   weak-mode change. Growth takes a census of integer keys by power-of-two
//!   bins and picks the largest array length that stays more than half
//!   full; everything else goes to a hash part rounded up to a power of
//!   two.
//! - Capacity hints above `2^30` are a `TableOverflow` from
//!   `try_with_capacity`; `with_capacity` ignores them.
//!
//! Weak tables
//! - `WeakMode` decides per binding, at insert time, whether each side is
//!   held through its weak handle. Value-like keys and values stay
//!   strong in any mode.
//! - Reads treat expired entries as absent without mutating; the sweep
//!   (`clear_expired`) and the next rehash reclaim them.
//!
//! Notes and non-goals
//! - No metamethods: every access is raw.
//! - No shrinking on delete; capacity only changes on rehash.
//! - `rc_value::Value` is a reference value type for hosts that rely on
//!   `Rc` for lifetime; embedders normally supply their own `LuaValue`.

mod array;
mod error;
mod hash_part;
mod iter;
mod list;
mod mode;
pub mod rc_value;
mod sizing;
mod slot;
mod table;
mod table_proptest;
mod value;

// Public surface
pub use error::{Result, TableError};
pub use iter::Iter;
pub use list::MAX_UNPACK;
pub use mode::WeakMode;
pub use rc_value::Value;
pub use sizing::MAX_ARRAY_BITS;
pub use table::Table;
pub use value::LuaValue;
