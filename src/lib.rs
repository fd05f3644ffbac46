//! chain-table: a single-threaded hash table with separate chaining for
//! fixed-size keys and values, meant to be embedded as a low-level
//! associative store (addresses to metadata, ids to payloads).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small table whose behavior is fully determined by two injected
//!   functions (hash and equality) and a resize policy, with every failure
//!   reported as a value.
//! - Layers:
//!   - Arena<K, V>: slot vector holding the entries; ids are stable between
//!     rehashes and freed slots are reused.
//!   - HashTable<K, V, S>: power-of-two bucket array of chain heads; chains
//!     are linked through the entries themselves.
//!   - KeyStrategy<K>: hash and equality for keys; `PointerHash` by default.
//!   - ResizePolicy: minimum size and grow/shrink thresholds.
//!
//! Constraints
//! - Single-threaded and synchronous. Mutation takes `&mut self`; lookups
//!   take `&self`. No interior mutability, so the table is `Send`/`Sync`
//!   whenever its key, value and strategy are, and an external lock is
//!   enough to share it.
//! - Unique keys: `insert` rejects an existing key with
//!   `InsertError::DuplicateKey`; `replace` overwrites.
//! - Bucket count is always a power of two, 16 or more by default.
//!
//! Hash caching and rehashing
//! - Each entry stores the hash computed at insertion. Lookups compare the
//!   cached hash before calling the strategy's `equals`, and rehashing
//!   uses only cached hashes; apart from a debug-build consistency check,
//!   the strategy's `hash` is never called for a stored key again.
//! - After an insert, a load factor above 0.50 grows the table; after a
//!   removal, one below 0.10 shrinks it. The new size is the entry count
//!   times `2 / (0.10 + 0.50)`, rounded up to a power of two. Entries are
//!   relinked into the new array; if more than half of the arena's slots are
//!   vacant, the live entries are also moved into a dense arena so removed
//!   entries do not pin memory.
//! - If the new bucket array cannot be allocated the rehash is abandoned
//!   and logged; the table stays at its old size and remains correct.
//!
//! Error reporting
//! - Construction and insertion return `AllocError` when memory cannot be
//!   reserved; nothing aborts on a failed reservation.
//! - A missing key is `None`, never an error.
//!
//! Notes and non-goals
//! - No iteration, no concurrent mutation, no serialization.
//! - Hash quality is entirely up to the strategy; `PointerHash` only
//!   rotates the bit pattern so aligned addresses spread across buckets.

mod arena;
pub mod chained_table;
mod chained_table_proptest;
pub mod error;
pub mod policy;
pub mod strategy;

// Public surface
pub use chained_table::{EntryRef, HashTable};
pub use error::{AllocError, InsertError, PolicyError};
pub use policy::{ResizePolicy, ResizePolicyBuilder};
pub use strategy::{
    hash_pointer, BuildHasherStrategy, FnStrategy, KeyStrategy, PointerHash, RawBits,
};
