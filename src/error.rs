//! Error types returned by table construction, insertion and policy
//! validation. Absence of a key is never an error; lookups and removals
//! report it through `Option`.

use std::collections::TryReserveError;
use thiserror::Error;

/// Memory for a bucket array or an entry slot could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The requested bucket count does not fit in `usize` once rounded up
    /// to a power of two.
    #[error("requested bucket count overflows usize")]
    CapacityOverflow,
    #[error("allocation failed: {0}")]
    Reserve(#[from] TryReserveError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// An entry comparing equal to the key is already stored. The table is
    /// left exactly as it was.
    #[error("an entry with an equal key is already present")]
    DuplicateKey,
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("minimum bucket count {0} is not a nonzero power of two")]
    MinBucketsNotPowerOfTwo(usize),
    #[error("shrink threshold {shrink_below} must be >= 0 and below grow threshold {grow_above}")]
    InvalidThresholds { shrink_below: f64, grow_above: f64 },
}
