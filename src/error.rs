//! Errors raised by table operations.

use thiserror::Error;

/// Caller contract violations. Every table operation either succeeds or
/// returns one of these synchronously; nothing is retried or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("index is nil")]
    NilKey,
    #[error("index is NaN")]
    NaNKey,
    /// A resumption key that is neither in the array range nor present
    /// (live or tombstoned) in the hash part.
    #[error("invalid key to 'next'")]
    InvalidNextKey,
    #[error("position {position} out of bounds")]
    PositionOutOfBounds { position: i64 },
    #[error("invalid value (at index {index}) in table for 'concat'")]
    InvalidConcatValue { index: i64 },
    #[error("attempt to compare incomparable values")]
    Incomparable,
    #[error("too many results to unpack")]
    TooManyResults,
    #[error("too many elements to move")]
    TooManyElementsToMove,
    #[error("destination wrap around")]
    DestinationWrapAround,
    /// A capacity hint beyond the largest array or hash part, or one the
    /// allocator refused.
    #[error("table overflow")]
    TableOverflow,
}

pub type Result<T, E = TableError> = core::result::Result<T, E>;
