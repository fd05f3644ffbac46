//! HashTable: bucket array of singly linked chains with load-factor driven
//! rehashing.

use crate::arena::{Arena, Entry, EntryId};
use crate::error::{AllocError, InsertError};
use crate::policy::ResizePolicy;
use crate::strategy::{FnStrategy, KeyStrategy, PointerHash, RawBits};
use core::fmt;
use core::mem::{self, size_of};
use log::{debug, trace, warn};

type Buckets = Vec<Option<EntryId>>;

/// Shared view of a stored entry, as returned by [`HashTable::lookup`].
pub struct EntryRef<'a, K, V> {
    entry: &'a Entry<K, V>,
}

impl<'a, K, V> EntryRef<'a, K, V> {
    pub fn key(&self) -> &'a K {
        &self.entry.key
    }

    pub fn value(&self) -> &'a V {
        &self.entry.value
    }

    /// Hash cached when the entry was inserted.
    pub fn hash(&self) -> u64 {
        self.entry.hash
    }
}

impl<K, V> Clone for EntryRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for EntryRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for EntryRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("key", self.key())
            .field("value", self.value())
            .field("hash", &self.hash())
            .finish()
    }
}

/// Hash table with separate chaining for fixed-size keys and values.
///
/// Keys are hashed and compared through the strategy `S`; the default,
/// [`PointerHash`], suits keys that are addresses or other word-like bit
/// patterns. Duplicate keys are rejected by [`insert`](Self::insert).
pub struct HashTable<K, V, S = PointerHash> {
    buckets: Buckets,
    arena: Arena<K, V>,
    strategy: S,
    policy: ResizePolicy,
}

fn alloc_buckets(len: usize) -> Result<Buckets, AllocError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(len)?;
    buckets.resize(len, None);
    Ok(buckets)
}

impl<K, V> HashTable<K, V>
where
    K: RawBits + Eq,
{
    /// Empty table with the default strategy and the minimum bucket count.
    pub fn new() -> Self {
        Self::with_strategy(PointerHash)
    }

    pub fn with_capacity(size_hint: usize) -> Result<Self, AllocError> {
        Self::with_capacity_and_strategy(size_hint, PointerHash)
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: RawBits + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H, E> HashTable<K, V, FnStrategy<H, E>>
where
    H: Fn(&K) -> u64,
    E: Fn(&K, &K) -> bool,
{
    /// Table whose keys are hashed by `hash` and compared by `equals`.
    pub fn with_fns(size_hint: usize, hash: H, equals: E) -> Result<Self, AllocError> {
        Self::with_capacity_and_strategy(size_hint, FnStrategy::new(hash, equals))
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    S: KeyStrategy<K>,
{
    pub fn with_strategy(strategy: S) -> Self {
        let policy = ResizePolicy::default();
        Self {
            buckets: vec![None; policy.min_buckets()],
            arena: Arena::new(),
            strategy,
            policy,
        }
    }

    /// Table with room for `size_hint` buckets, rounded up to a power of
    /// two and never below 16.
    pub fn with_capacity_and_strategy(size_hint: usize, strategy: S) -> Result<Self, AllocError> {
        Self::with_policy(size_hint, strategy, ResizePolicy::default())
    }

    pub fn with_policy(
        size_hint: usize,
        strategy: S,
        policy: ResizePolicy,
    ) -> Result<Self, AllocError> {
        let num_buckets = policy
            .round_size(size_hint)
            .ok_or(AllocError::CapacityOverflow)?;
        let buckets = alloc_buckets(num_buckets)?;
        trace!("created table with {} buckets", num_buckets);
        Ok(Self {
            buckets,
            arena: Arena::new(),
            strategy,
            policy,
        })
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn find(&self, hash: u64, key: &K) -> Option<EntryId> {
        let mut cursor = self.buckets[self.bucket_index(hash)];
        while let Some(id) = cursor {
            let entry = &self.arena[id];
            // Cached hash first; the strategy only runs on a hash match.
            if entry.hash == hash && self.strategy.equals(key, &entry.key) {
                return Some(id);
            }
            cursor = entry.next;
        }
        None
    }

    pub fn lookup(&self, key: &K) -> Option<EntryRef<'_, K, V>> {
        let hash = self.strategy.hash(key);
        self.find(hash, key).map(|id| EntryRef {
            entry: &self.arena[id],
        })
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.lookup(key).map(|e| e.value())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.strategy.hash(key);
        let id = self.find(hash, key)?;
        Some(&mut self.arena[id].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Inserts a new entry.
    ///
    /// Fails with [`InsertError::DuplicateKey`] if an equal key is already
    /// present, or [`InsertError::Alloc`] if the entry cannot be stored. In
    /// both cases the table is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let hash = self.strategy.hash(&key);
        if self.find(hash, &key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.link_new(hash, key, value)?;
        Ok(())
    }

    /// Inserts `value` under `key`, overwriting and returning the previous
    /// value if the key was present.
    pub fn replace(&mut self, key: K, value: V) -> Result<Option<V>, AllocError> {
        let hash = self.strategy.hash(&key);
        if let Some(id) = self.find(hash, &key) {
            return Ok(Some(mem::replace(&mut self.arena[id].value, value)));
        }
        self.link_new(hash, key, value)?;
        Ok(None)
    }

    fn link_new(&mut self, hash: u64, key: K, value: V) -> Result<(), AllocError> {
        let index = self.bucket_index(hash);
        let id = self.arena.try_insert(Entry {
            hash,
            key,
            value,
            next: self.buckets[index],
        })?;
        self.buckets[index] = Some(id);

        if self.policy.should_grow(self.len(), self.num_buckets()) {
            self.rehash();
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry for `key`, returning its key and value. A missing
    /// key is a no-op.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.strategy.hash(key);
        let index = self.bucket_index(hash);

        let mut previous = None;
        let mut cursor = self.buckets[index];
        while let Some(id) = cursor {
            let entry = &self.arena[id];
            if entry.hash == hash && self.strategy.equals(key, &entry.key) {
                break;
            }
            previous = Some(id);
            cursor = entry.next;
        }

        let entry = self.arena.remove(cursor?)?;
        match previous {
            Some(prev) => self.arena[prev].next = entry.next,
            None => self.buckets[index] = entry.next,
        }

        if self.policy.should_shrink(self.len(), self.num_buckets()) {
            self.rehash();
        }
        Some((entry.key, entry.value))
    }

    /// Drops every entry and shrinks back to the minimum bucket count.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.buckets.fill(None);
        self.resize(self.policy.min_buckets());
    }

    fn rehash(&mut self) {
        match self.policy.rehash_target(self.len()) {
            Some(target) => self.resize(target),
            None => warn!(
                "rehash skipped: bucket count for {} entries overflows",
                self.len()
            ),
        }
    }

    /// Moves every entry into a fresh array of `new_size` buckets. If the
    /// array cannot be allocated the table keeps its current buckets.
    ///
    /// A mostly vacant arena is compacted on the way: live entries move into
    /// a dense arena sized to the entry count and the old slots are freed.
    fn resize(&mut self, new_size: usize) {
        let old_size = self.buckets.len();
        if new_size == old_size {
            return;
        }
        let new_buckets = match alloc_buckets(new_size) {
            Ok(buckets) => buckets,
            Err(err) => {
                warn!(
                    "rehash from {} to {} buckets failed, keeping current size: {}",
                    old_size, new_size, err
                );
                return;
            }
        };
        // Compaction is optional; without room for it the entries stay put.
        let mut dense = if self.arena.is_sparse() {
            Arena::try_with_capacity(self.len()).ok()
        } else {
            None
        };

        let old_buckets = mem::replace(&mut self.buckets, new_buckets);
        let mask = new_size - 1;
        for head in old_buckets {
            let mut cursor = head;
            while let Some(id) = cursor {
                debug_assert_eq!(
                    self.strategy.hash(&self.arena[id].key),
                    self.arena[id].hash
                );
                let index = (self.arena[id].hash as usize) & mask;
                let new_id = match dense.as_mut() {
                    Some(dense) => {
                        let mut entry = self.arena.take(id);
                        cursor = entry.next;
                        entry.next = self.buckets[index];
                        dense.push(entry)
                    }
                    None => {
                        let entry = &mut self.arena[id];
                        cursor = entry.next;
                        entry.next = self.buckets[index];
                        id
                    }
                };
                self.buckets[index] = Some(new_id);
            }
        }
        if let Some(dense) = dense {
            self.arena = dense;
            debug!("compacted entry storage to {} slots", self.len());
        }
        debug!(
            "rehashed {} entries from {} to {} buckets",
            self.len(),
            old_size,
            new_size
        );
    }
}

impl<K, V, S> HashTable<K, V, S> {
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count; always a power of two.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.num_buckets() as f64
    }

    /// Width in bytes of a stored key.
    pub const fn key_size(&self) -> usize {
        size_of::<K>()
    }

    /// Width in bytes of a stored value.
    pub const fn value_size(&self) -> usize {
        size_of::<V>()
    }

    pub fn policy(&self) -> &ResizePolicy {
        &self.policy
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Length of the longest chain. Walks every bucket.
    pub fn longest_chain(&self) -> usize {
        self.buckets
            .iter()
            .map(|&head| self.chain_len(head))
            .max()
            .unwrap_or(0)
    }

    fn chain_len(&self, head: Option<EntryId>) -> usize {
        let mut len = 0;
        let mut cursor = head;
        while let Some(id) = cursor {
            len += 1;
            cursor = self.arena[id].next;
        }
        len
    }
}

impl<K, V, S> fmt::Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("entries", &self.len())
            .field("num_buckets", &self.num_buckets())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl<K, V, S> HashTable<K, V, S>
where
    S: KeyStrategy<K>,
{
    /// Walks every chain and checks the structural invariants: power-of-two
    /// bucket count, each entry in the bucket its cached hash selects, the
    /// cached hash matching the strategy, and `len` matching the reachable
    /// entry count.
    pub(crate) fn assert_consistent(&self) {
        let n = self.num_buckets();
        assert!(n.is_power_of_two());
        assert!(n >= self.policy.min_buckets());
        let mut reachable = 0;
        for (index, &head) in self.buckets.iter().enumerate() {
            let mut cursor = head;
            while let Some(id) = cursor {
                let entry = &self.arena[id];
                assert_eq!((entry.hash as usize) & (n - 1), index);
                assert_eq!(self.strategy.hash(&entry.key), entry.hash);
                reachable += 1;
                cursor = entry.next;
            }
        }
        assert_eq!(reachable, self.len());
    }
}
