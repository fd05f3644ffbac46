//! Entry storage for the chained table.
//!
//! Every entry lives in one slot of a growable vector and is addressed by
//! its `EntryId`. Chains are threaded through the entries' `next` links, so
//! moving an entry to another bucket only rewrites links. Vacant slots form a free list and
//! are reused before the vector grows. Growth goes through `try_reserve` so
//! an allocation failure is reported instead of aborting.
//!
//! Removed entries leave vacant slots behind. When the table rehashes an
//! arena that is mostly vacant, it moves the live entries into a dense arena
//! and drops the old slot vector, so storage follows the live entry count.

use crate::error::AllocError;
use core::ops::{Index, IndexMut};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct EntryId(usize);

#[cfg(test)]
impl EntryId {
    pub(crate) fn at(slot: usize) -> Self {
        Self(slot)
    }
}

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<EntryId>,
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied(Entry<K, V>),
    Vacant { next_free: Option<EntryId> },
}

#[derive(Debug)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<EntryId>,
    len: usize,
    #[cfg(test)]
    pub(crate) fail_growth: bool,
}

impl<K, V> Arena<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            #[cfg(test)]
            fail_growth: false,
        }
    }

    /// Empty arena with room for `capacity` entries.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let mut arena = Self::new();
        arena.slots.try_reserve_exact(capacity)?;
        Ok(arena)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// More than half of the slots are vacant.
    pub(crate) fn is_sparse(&self) -> bool {
        self.slots.len() > 2 * self.len
    }

    /// Stores `entry` and returns its id. On failure the arena is unchanged
    /// and `entry` is dropped.
    pub(crate) fn try_insert(&mut self, entry: Entry<K, V>) -> Result<EntryId, AllocError> {
        if let Some(id) = self.free_head {
            let slot = &mut self.slots[id.0];
            self.free_head = match slot {
                Slot::Vacant { next_free } => *next_free,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            };
            *slot = Slot::Occupied(entry);
            self.len += 1;
            return Ok(id);
        }

        self.grow()?;
        Ok(self.push(entry))
    }

    fn grow(&mut self) -> Result<(), AllocError> {
        #[cfg(test)]
        if self.fail_growth {
            return Err(AllocError::CapacityOverflow);
        }
        self.slots.try_reserve(1)?;
        Ok(())
    }

    /// Appends `entry` in a fresh slot. Callers reserve the room first.
    pub(crate) fn push(&mut self, entry: Entry<K, V>) -> EntryId {
        debug_assert!(self.slots.len() < self.slots.capacity());
        let id = EntryId(self.slots.len());
        self.slots.push(Slot::Occupied(entry));
        self.len += 1;
        id
    }

    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Entry<K, V>> {
        let slot = self.slots.get_mut(id.0)?;
        if let Slot::Vacant { .. } = slot {
            return None;
        }
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let Slot::Occupied(entry) = core::mem::replace(slot, vacant) else {
            unreachable!()
        };
        self.free_head = Some(id);
        self.len -= 1;
        Some(entry)
    }

    /// Removes a live entry; panics on a dangling id like indexing does.
    pub(crate) fn take(&mut self, id: EntryId) -> Entry<K, V> {
        match self.remove(id) {
            Some(entry) => entry,
            None => panic!("dangling entry id {:?}", id),
        }
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&Entry<K, V>> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(entry)) => Some(entry),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry<K, V>> {
        match self.slots.get_mut(id.0) {
            Some(Slot::Occupied(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Drops every entry and releases the slot vector.
    pub(crate) fn clear(&mut self) {
        self.slots = Vec::new();
        self.free_head = None;
        self.len = 0;
    }
}

// Chains only ever link live ids; a vacant id reached through a bucket is a
// broken table, not a recoverable condition.
impl<K, V> Index<EntryId> for Arena<K, V> {
    type Output = Entry<K, V>;

    fn index(&self, id: EntryId) -> &Self::Output {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("dangling entry id {:?}", id),
        }
    }
}

impl<K, V> IndexMut<EntryId> for Arena<K, V> {
    fn index_mut(&mut self, id: EntryId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(entry) => entry,
            None => panic!("dangling entry id {:?}", id),
        }
    }
}
