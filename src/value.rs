//! The value contract consumed by the table engine.
//!
//! The engine never inspects values beyond this trait. Equality and
//! hashing are *raw*: no metamethods, no coercions other than the
//! integer view of numeric keys.

use core::hash::Hasher;

/// A dynamically typed runtime value as seen by a [`Table`](crate::Table).
///
/// Reference-like categories (tables, functions, coroutines, host
/// objects) report a weak handle from [`downgrade`](LuaValue::downgrade);
/// value-like categories return `None` and are always held strongly,
/// even inside a weak table.
pub trait LuaValue: Clone {
    /// Host weak-handle primitive. Resolving it may report "expired" at
    /// any time.
    type Weak: Clone;

    fn nil() -> Self;
    fn is_nil(&self) -> bool;

    /// NaN can never be used as a key.
    fn is_nan(&self) -> bool {
        false
    }

    /// Raw equality. Must agree with [`raw_hash`](LuaValue::raw_hash) for
    /// keys without an integer view.
    fn raw_eq(&self, other: &Self) -> bool;

    /// Feed the value's identity into `state`. Only called for keys whose
    /// [`as_integer`](LuaValue::as_integer) is `None`; integer keys are
    /// hashed through their integer form by the table.
    fn raw_hash<H: Hasher>(&self, state: &mut H);

    /// Integer view of the value, if it is exactly representable as one
    /// (integers, and floats with an integral value).
    fn as_integer(&self) -> Option<i64>;

    fn from_integer(i: i64) -> Self;

    /// Numeric view used by the legacy max-numeric-key scan.
    fn as_number(&self) -> Option<f64>;

    /// Weak handle for reference-like values; `None` for value-like ones.
    fn downgrade(&self) -> Option<Self::Weak>;

    /// Resolve a weak handle; `None` once the target has been reclaimed.
    fn upgrade(weak: &Self::Weak) -> Option<Self>;

    /// Primitive less-than used by the default sort. `None` when the
    /// operands cannot be ordered without metamethods.
    fn raw_lt(&self, other: &Self) -> Option<bool>;

    /// Append the concat representation (strings and numbers only).
    /// Returns `false`, leaving `out` untouched, for other values.
    fn write_concat(&self, out: &mut String) -> bool;
}

/// Positive integer key usable as a 1-based array position.
#[inline]
pub(crate) fn array_index<V: LuaValue>(key: &V) -> Option<usize> {
    key.as_integer()
        .filter(|&i| i >= 1)
        .and_then(|i| usize::try_from(i).ok())
}
