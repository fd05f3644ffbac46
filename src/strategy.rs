//! Key strategies: how a table hashes keys and decides whether two keys
//! are the same.
//!
//! A table never calls `Hash` or `Eq` on its keys directly; it goes through
//! the [`KeyStrategy`] it was built with. The hash is computed once, at
//! insertion, and cached on the entry; rehashing only reads the cached value.
//!
//! - [`PointerHash`] is the default. It treats a key as an opaque
//!   fixed-width bit pattern (an address, an id, a byte array) and compares
//!   keys by exact equality.
//! - [`FnStrategy`] wraps a pair of closures.
//! - [`BuildHasherStrategy`] adapts any `BuildHasher` for `K: Hash + Eq`.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem::size_of;
use core::ptr::NonNull;
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash value reserved as "no hash"; [`hash_pointer`] never produces it.
pub const INVALID_HASH: usize = usize::MAX;

/// Hash and equality for keys of type `K`.
///
/// Implementations must be consistent: keys that are `equals` must hash
/// to the same value, and hashing the same key twice must give the same
/// result for as long as the key is stored.
pub trait KeyStrategy<K: ?Sized> {
    fn hash(&self, key: &K) -> u64;

    /// Whether `key` matches `candidate`, the key of a stored entry.
    fn equals(&self, key: &K, candidate: &K) -> bool;
}

/// Keys that can be reduced to a machine word bit pattern.
pub trait RawBits {
    fn raw_bits(&self) -> usize;
}

macro_rules! raw_bits_by_cast {
    ($($t:ty),*) => {$(
        impl RawBits for $t {
            #[inline]
            fn raw_bits(&self) -> usize {
                *self as usize
            }
        }
    )*};
}

macro_rules! raw_bits_by_fold {
    ($($t:ty),*) => {$(
        impl RawBits for $t {
            #[inline]
            fn raw_bits(&self) -> usize {
                fold_words(&self.to_ne_bytes())
            }
        }
    )*};
}

raw_bits_by_cast!(u8, u16, u32, usize, i8, i16, i32, isize);
raw_bits_by_fold!(u64, i64, u128, i128);

impl<T: ?Sized> RawBits for *const T {
    #[inline]
    fn raw_bits(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> RawBits for *mut T {
    #[inline]
    fn raw_bits(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> RawBits for NonNull<T> {
    #[inline]
    fn raw_bits(&self) -> usize {
        self.as_ptr().raw_bits()
    }
}

impl<const N: usize> RawBits for [u8; N] {
    #[inline]
    fn raw_bits(&self) -> usize {
        fold_words(self)
    }
}

/// Folds a byte string into one word: native-endian words, the last one
/// zero-padded, combined with rotate-xor. A string of exactly one word
/// folds to that word.
pub fn fold_words(bytes: &[u8]) -> usize {
    const WORD: usize = size_of::<usize>();
    bytes.chunks(WORD).fold(0usize, |acc, chunk| {
        let mut buf = [0u8; WORD];
        buf[..chunk.len()].copy_from_slice(chunk);
        acc.rotate_left(5) ^ usize::from_ne_bytes(buf)
    })
}

/// Hashes a word-sized bit pattern such as an address.
///
/// Aligned addresses have their low 3 or 4 bits clear, so the pattern is
/// rotated right by 4 to move that entropy-free tail out of the bucket
/// index bits. [`INVALID_HASH`] is remapped to `INVALID_HASH - 1`.
#[inline]
pub fn hash_pointer(bits: usize) -> usize {
    let hash = bits.rotate_right(4);
    if hash == INVALID_HASH {
        INVALID_HASH - 1
    } else {
        hash
    }
}

/// Default strategy: [`hash_pointer`] over the key's bit pattern, exact
/// equality for comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerHash;

impl<K: RawBits + Eq> KeyStrategy<K> for PointerHash {
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        hash_pointer(key.raw_bits()) as u64
    }

    #[inline]
    fn equals(&self, key: &K, candidate: &K) -> bool {
        key == candidate
    }
}

/// Strategy built from a hash closure and an equality closure.
#[derive(Clone, Copy)]
pub struct FnStrategy<H, E> {
    hash: H,
    equals: E,
}

impl<H, E> FnStrategy<H, E> {
    pub fn new(hash: H, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<H, E> fmt::Debug for FnStrategy<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

impl<K, H, E> KeyStrategy<K> for FnStrategy<H, E>
where
    K: ?Sized,
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn equals(&self, key: &K, candidate: &K) -> bool {
        (self.equals)(key, candidate)
    }
}

/// Strategy for `K: Hash + Eq` keys backed by a `BuildHasher`.
#[derive(Debug, Clone, Default)]
pub struct BuildHasherStrategy<S = DefaultHashBuilder> {
    hasher: S,
}

impl<S> BuildHasherStrategy<S> {
    pub fn new(hasher: S) -> Self {
        Self { hasher }
    }
}

impl<K, S> KeyStrategy<K> for BuildHasherStrategy<S>
where
    K: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn equals(&self, key: &K, candidate: &K) -> bool {
        key == candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn hash_pointer_rotates_low_bits_out() {
        assert_eq!(hash_pointer(0x10), 0x1);
        assert_eq!(hash_pointer(0x1230), 0x123);
        // Low nibble wraps around to the top of the word.
        assert_eq!(hash_pointer(0xF), 0xF << (usize::BITS - 4));
        assert_eq!(hash_pointer(0), 0);
    }

    #[test]
    fn hash_pointer_never_returns_invalid() {
        assert_eq!(hash_pointer(usize::MAX), INVALID_HASH - 1);
        for bits in [1usize, 0x1000, usize::MAX - 1, usize::MAX >> 1] {
            assert_ne!(hash_pointer(bits), INVALID_HASH);
        }
    }

    /// Aligned addresses spread across buckets instead of piling into the
    /// buckets whose low index bits are zero.
    #[test]
    fn aligned_addresses_spread() {
        let mask = 15usize;
        let buckets: std::collections::BTreeSet<usize> = (0..16usize)
            .map(|i| hash_pointer(0x7000_0000 + i * 16) & mask)
            .collect();
        assert_eq!(buckets.len(), 16);
    }

    #[test]
    fn fold_words_of_a_single_word_is_identity() {
        let word = 0x0123_4567usize;
        assert_eq!(fold_words(&word.to_ne_bytes()), word);
        assert_eq!(fold_words(&[]), 0);
    }

    #[test]
    fn raw_bits_for_common_key_types() {
        assert_eq!(42u32.raw_bits(), 42);
        assert_eq!(7usize.raw_bits(), 7);
        assert_eq!(7u64.raw_bits(), fold_words(&7u64.to_ne_bytes()));

        let x = 5i32;
        let p: *const i32 = &x;
        assert_eq!(p.raw_bits(), p as usize);
        assert_eq!(NonNull::from(&x).raw_bits(), p as usize);

        let a = *b"some random string";
        let b = *b"some random strinG";
        assert_ne!(a.raw_bits(), b.raw_bits());
    }

    #[test]
    fn pointer_hash_strategy() {
        let s = PointerHash;
        assert_eq!(KeyStrategy::<usize>::hash(&s, &0x40), 0x4);
        assert!(s.equals(&b"abc".to_owned(), &b"abc".to_owned()));
        assert!(!s.equals(&1u32, &2u32));
    }

    #[test]
    fn fn_strategy_delegates() {
        let s = FnStrategy::new(|k: &u32| (*k as u64) * 3, |a: &u32, b: &u32| a % 10 == b % 10);
        assert_eq!(KeyStrategy::<u32>::hash(&s, &4), 12);
        assert!(KeyStrategy::<u32>::equals(&s, &13, &3));
        assert!(!KeyStrategy::<u32>::equals(&s, &13, &4));
        assert_eq!(format!("{:?}", s), "FnStrategy { .. }");
    }

    #[test]
    fn build_hasher_strategy_is_consistent() {
        let s = BuildHasherStrategy::new(RandomState::new());
        let k = String::from("key");
        assert_eq!(s.hash(&k), s.hash(&k.clone()));
        assert!(s.equals(&k, &"key".to_string()));

        let d: BuildHasherStrategy = BuildHasherStrategy::default();
        assert_eq!(d.hash("x"), d.hash("x"));
    }
}
