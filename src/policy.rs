//! Resize policy: how many buckets a table starts with and when it grows
//! or shrinks.
//!
//! The bucket count is always a power of two no smaller than
//! `min_buckets`. After an insert the table grows once
//! `entries / buckets > grow_above`; after a removal it shrinks once
//! `entries / buckets < shrink_below`. Either way the new size is
//! `round_size(entries * 2 / (shrink_below + grow_above))`, which lands the
//! load factor near the midpoint of the two thresholds.

use crate::error::PolicyError;

/// Smallest bucket array a table will ever hold by default.
pub const MIN_BUCKETS: usize = 16;
/// Default grow threshold (load factor).
pub const GROW_ABOVE: f64 = 0.50;
/// Default shrink threshold (load factor).
pub const SHRINK_BELOW: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePolicy {
    min_buckets: usize,
    grow_above: f64,
    shrink_below: f64,
}

impl ResizePolicy {
    /// The default policy: 16 buckets minimum, grow above 0.50, shrink
    /// below 0.10.
    pub const fn new() -> Self {
        Self {
            min_buckets: MIN_BUCKETS,
            grow_above: GROW_ABOVE,
            shrink_below: SHRINK_BELOW,
        }
    }

    pub fn builder() -> ResizePolicyBuilder {
        ResizePolicyBuilder {
            policy: Self::new(),
        }
    }

    pub fn min_buckets(&self) -> usize {
        self.min_buckets
    }

    pub fn grow_above(&self) -> f64 {
        self.grow_above
    }

    pub fn shrink_below(&self) -> f64 {
        self.shrink_below
    }

    /// Rounds `n` up to a power of two, never below `min_buckets`.
    /// Returns `None` when the power of two does not fit in `usize`.
    pub fn round_size(&self, n: usize) -> Option<usize> {
        if n < self.min_buckets {
            return Some(self.min_buckets);
        }
        n.checked_next_power_of_two()
    }

    /// Multiplier applied to the entry count to pick a new bucket count.
    pub fn rehash_factor(&self) -> f64 {
        2.0 / (self.shrink_below + self.grow_above)
    }

    /// Bucket count a table holding `entries` entries should be resized to.
    pub fn rehash_target(&self, entries: usize) -> Option<usize> {
        // `as` saturates, so an absurd product surfaces as `None` below.
        let wanted = (entries as f64 * self.rehash_factor()) as usize;
        self.round_size(wanted)
    }

    pub(crate) fn should_grow(&self, entries: usize, buckets: usize) -> bool {
        entries as f64 / buckets as f64 > self.grow_above
    }

    pub(crate) fn should_shrink(&self, entries: usize, buckets: usize) -> bool {
        (entries as f64 / buckets as f64) < self.shrink_below
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ResizePolicy`]; `build` validates the combination.
#[derive(Debug, Clone)]
pub struct ResizePolicyBuilder {
    policy: ResizePolicy,
}

impl ResizePolicyBuilder {
    pub fn min_buckets(mut self, min_buckets: usize) -> Self {
        self.policy.min_buckets = min_buckets;
        self
    }

    pub fn grow_above(mut self, load_factor: f64) -> Self {
        self.policy.grow_above = load_factor;
        self
    }

    pub fn shrink_below(mut self, load_factor: f64) -> Self {
        self.policy.shrink_below = load_factor;
        self
    }

    pub fn build(self) -> Result<ResizePolicy, PolicyError> {
        let p = self.policy;
        if !p.min_buckets.is_power_of_two() {
            return Err(PolicyError::MinBucketsNotPowerOfTwo(p.min_buckets));
        }
        // Written so that NaN in either threshold is rejected.
        let ordered = p.shrink_below >= 0.0 && p.grow_above > p.shrink_below;
        if !ordered || !p.grow_above.is_finite() {
            return Err(PolicyError::InvalidThresholds {
                shrink_below: p.shrink_below,
                grow_above: p.grow_above,
            });
        }
        Ok(p)
    }
}
