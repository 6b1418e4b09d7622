//! Rehash sizing policy.
//!
//! A rehash takes a census of every live key (plus the key whose
//! insertion triggered it) and picks the largest power-of-two array
//! length that would be more than half full. Everything else goes to the
//! hash part, whose bucket count is the next power of two that fits it.

use crate::error::{Result, TableError};

/// Largest array part is `2^MAX_ARRAY_BITS` cells; integer keys above
/// that always live in the hash part.
pub const MAX_ARRAY_BITS: usize = 30;
pub(crate) const MAX_ARRAY_LEN: usize = 1 << MAX_ARRAY_BITS;
/// Largest hash part is `2^MAX_HASH_BITS` buckets.
pub(crate) const MAX_HASH_BITS: usize = 30;
pub(crate) const MAX_HASH_LEN: usize = 1 << MAX_HASH_BITS;

/// Histogram of positive integer keys over power-of-two ranges:
/// `bins[b]` counts keys in `(2^(b-1), 2^b]`, with `bins[0]` counting key 1.
#[derive(Debug, Clone)]
pub(crate) struct KeyCensus {
    bins: [usize; MAX_ARRAY_BITS + 1],
    integer_keys: usize,
}

/// Outcome of [`KeyCensus::array_split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArraySplit {
    /// New array length (0 or a power of two).
    pub len: usize,
    /// Number of census keys that land inside `1..=len`.
    pub in_array: usize,
}

impl KeyCensus {
    pub fn new() -> Self {
        Self {
            bins: [0; MAX_ARRAY_BITS + 1],
            integer_keys: 0,
        }
    }

    /// Record one live key. `index` is its array position if the key is a
    /// positive integer.
    pub fn count(&mut self, index: Option<usize>) {
        if let Some(k) = index.filter(|&k| k <= MAX_ARRAY_LEN) {
            self.bins[ceil_log2(k)] += 1;
            self.integer_keys += 1;
        }
    }

    pub fn array_split(&self) -> ArraySplit {
        let mut cumulative = 0;
        let mut split = ArraySplit {
            len: 0,
            in_array: 0,
        };
        for (bit, &n) in self.bins.iter().enumerate() {
            let size = 1usize << bit;
            // No larger size can be more than half full.
            if self.integer_keys <= size / 2 {
                break;
            }
            cumulative += n;
            if cumulative > size / 2 {
                split = ArraySplit {
                    len: size,
                    in_array: cumulative,
                };
            }
        }
        split
    }
}

impl Default for KeyCensus {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn ceil_log2(k: usize) -> usize {
    if k <= 1 {
        0
    } else {
        (usize::BITS - (k - 1).leading_zeros()) as usize
    }
}

/// Bucket count for `entries` hash-resident slots: 0 when empty,
/// otherwise the next power of two, at least 2.
pub(crate) fn hash_capacity(entries: usize) -> usize {
    if entries == 0 {
        0
    } else {
        entries.next_power_of_two().max(2)
    }
}

/// Array length for a construction hint. The hint must not exceed
/// `MAX_ARRAY_LEN`.
fn array_capacity(hint: usize) -> usize {
    if hint == 0 {
        0
    } else {
        hint.next_power_of_two()
    }
}

/// Part sizes for construction hints `(narray, nhash)`, or
/// `TableOverflow` when either exceeds its part's ceiling.
pub(crate) fn presize(narray: usize, nhash: usize) -> Result<(usize, usize)> {
    if narray > MAX_ARRAY_LEN || nhash > MAX_HASH_LEN {
        return Err(TableError::TableOverflow);
    }
    Ok((array_capacity(narray), hash_capacity(nhash)))
}
