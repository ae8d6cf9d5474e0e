//! Block-allocated element pools with free-slot recycling
//!
//! A pool is a growable array of fixed-size blocks. Each block tracks its
//! own garbage queue of freed offsets so removal is O(1) and allocation
//! prefers recycled slots before extending the pool. Trailing all-garbage
//! blocks are released so sparse pools do not retain memory.

use crate::error::{GraphError, GraphResult};
use rayon::prelude::*;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

/// An element that can live in an [`ElementPool`]
///
/// `key` is the element's external id; `slot` is the dense store id the
/// pool assigns on insertion and clears on removal.
pub(crate) trait PoolElement {
    fn key(&self) -> u64;
    fn slot(&self) -> Option<u32>;
    fn set_slot(&mut self, slot: Option<u32>);
}

/// Fixed-capacity segment of a pool's backing array
///
/// A slot is either live (`Some`) or garbage (`None` with its offset queued
/// for reuse); the two states are exhaustive over the occupied prefix.
#[derive(Debug)]
struct Block<T> {
    slots: Vec<Option<T>>,
    // Freed offsets, reused LIFO. Offsets fit in u16 because block
    // capacity never exceeds 65536.
    garbage: Vec<u16>,
}

impl<T> Block<T> {
    fn new() -> Self {
        Block {
            slots: Vec::new(),
            garbage: Vec::new(),
        }
    }

    fn live_len(&self) -> usize {
        self.slots.len() - self.garbage.len()
    }
}

/// Growable pool of elements with O(1) lookup by external id or slot
#[derive(Debug)]
pub(crate) struct ElementPool<T> {
    block_size: usize,
    blocks: Vec<Block<T>>,
    /// External id -> global slot
    dictionary: FxHashMap<u64, u32>,
    /// Occupied slots, kept for view materialization and set algebra
    live: RoaringBitmap,
    len: usize,
}

impl<T: PoolElement> ElementPool<T> {
    pub fn new(block_size: usize) -> Self {
        ElementPool {
            block_size,
            blocks: Vec::new(),
            dictionary: FxHashMap::default(),
            live: RoaringBitmap::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains_key(&self, key: u64) -> bool {
        self.dictionary.contains_key(&key)
    }

    pub fn slot_of(&self, key: u64) -> Option<u32> {
        self.dictionary.get(&key).copied()
    }

    pub fn live(&self) -> &RoaringBitmap {
        &self.live
    }

    pub fn get(&self, key: u64) -> Option<&T> {
        self.get_slot(self.slot_of(key)?)
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut T> {
        let slot = self.slot_of(key)?;
        self.get_slot_mut(slot)
    }

    pub fn get_slot(&self, slot: u32) -> Option<&T> {
        let (block, offset) = self.split(slot);
        self.blocks.get(block)?.slots.get(offset)?.as_ref()
    }

    pub fn get_slot_mut(&mut self, slot: u32) -> Option<&mut T> {
        let (block, offset) = self.split(slot);
        self.blocks.get_mut(block)?.slots.get_mut(offset)?.as_mut()
    }

    /// Insert an element, assigning a fresh or recycled slot
    ///
    /// The caller is responsible for rejecting duplicate external ids with
    /// a store-specific error before calling this.
    pub fn add(&mut self, mut element: T) -> GraphResult<u32> {
        if element.slot().is_some() {
            return Err(GraphError::AlreadyInStore);
        }
        let slot = self.allocate()?;
        element.set_slot(Some(slot));
        self.dictionary.insert(element.key(), slot);
        self.live.insert(slot);
        self.len += 1;

        let (block, offset) = self.split(slot);
        let slots = &mut self.blocks[block].slots;
        if offset == slots.len() {
            slots.push(Some(element));
        } else {
            slots[offset] = Some(element);
        }
        Ok(slot)
    }

    /// Remove the element with the given external id, clearing its slot
    pub fn remove(&mut self, key: u64) -> Option<T> {
        let slot = self.dictionary.remove(&key)?;
        let (block, offset) = self.split(slot);
        let mut element = self.blocks[block].slots[offset].take()?;
        self.blocks[block].garbage.push(offset as u16);
        element.set_slot(None);
        self.live.remove(slot);
        self.len -= 1;

        self.reclaim_trailing_blocks();
        self.maybe_trim_dictionary();
        Some(element)
    }

    /// Iterate live elements in block/slot order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.blocks
            .iter()
            .flat_map(|block| block.slots.iter().filter_map(|slot| slot.as_ref()))
    }

    /// Parallel iteration over live elements, split at block boundaries
    pub fn par_iter(&self) -> impl ParallelIterator<Item = &T>
    where
        T: Send + Sync,
    {
        self.blocks
            .par_iter()
            .flat_map_iter(|block| block.slots.iter().filter_map(|slot| slot.as_ref()))
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.dictionary = FxHashMap::default();
        self.live = RoaringBitmap::new();
        self.len = 0;
    }

    fn split(&self, slot: u32) -> (usize, usize) {
        let slot = slot as usize;
        (slot / self.block_size, slot % self.block_size)
    }

    /// Pick a slot: recycled garbage first, then extend the tail block,
    /// then open a new block.
    fn allocate(&mut self) -> GraphResult<u32> {
        for (b, block) in self.blocks.iter_mut().enumerate() {
            if let Some(offset) = block.garbage.pop() {
                return Ok((b * self.block_size + offset as usize) as u32);
            }
        }
        let tail = match self.blocks.last() {
            Some(block) if block.slots.len() < self.block_size => self.blocks.len() - 1,
            _ => {
                let global = self.blocks.len() * self.block_size;
                if global + self.block_size - 1 > u32::MAX as usize {
                    return Err(GraphError::PoolExhausted);
                }
                self.blocks.push(Block::new());
                self.blocks.len() - 1
            }
        };
        let offset = self.blocks[tail].slots.len();
        Ok((tail * self.block_size + offset) as u32)
    }

    fn reclaim_trailing_blocks(&mut self) {
        while matches!(self.blocks.last(), Some(block) if block.live_len() == 0) {
            self.blocks.pop();
        }
    }

    /// Shed dictionary capacity after bulk removal
    fn maybe_trim_dictionary(&mut self) {
        if self.dictionary.capacity() > 64 && self.dictionary.capacity() > self.len * 4 {
            self.dictionary.shrink_to_fit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Probe {
        key: u64,
        slot: Option<u32>,
    }

    impl Probe {
        fn new(key: u64) -> Self {
            Probe { key, slot: None }
        }
    }

    impl PoolElement for Probe {
        fn key(&self) -> u64 {
            self.key
        }

        fn slot(&self) -> Option<u32> {
            self.slot
        }

        fn set_slot(&mut self, slot: Option<u32>) {
            self.slot = slot;
        }
    }

    #[test]
    fn test_add_assigns_dense_slots() {
        let mut pool = ElementPool::new(64);
        for key in 0..10 {
            let slot = pool.add(Probe::new(key)).unwrap();
            assert_eq!(slot, key as u32);
        }
        assert_eq!(pool.len(), 10);
        assert_eq!(pool.get(3).unwrap().key, 3);
        assert_eq!(pool.get_slot(3).unwrap().key, 3);
    }

    #[test]
    fn test_add_rejects_element_with_slot() {
        let mut pool = ElementPool::new(64);
        let mut probe = Probe::new(1);
        probe.slot = Some(0);
        assert_eq!(pool.add(probe), Err(GraphError::AlreadyInStore));
    }

    #[test]
    fn test_remove_recycles_slots() {
        let mut pool = ElementPool::new(64);
        for key in 0..5 {
            pool.add(Probe::new(key)).unwrap();
        }
        let removed = pool.remove(2).unwrap();
        assert_eq!(removed.slot, None);
        assert!(!pool.contains_key(2));

        // The freed slot is preferred over extending the pool.
        let slot = pool.add(Probe::new(99)).unwrap();
        assert_eq!(slot, 2);
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_remove_then_add_reuses_exactly_freed_slots() {
        let mut pool = ElementPool::new(64);
        for key in 0..20 {
            pool.add(Probe::new(key)).unwrap();
        }
        for key in 5..15 {
            pool.remove(key).unwrap();
        }
        let mut reused: Vec<u32> = (100..110).map(|key| pool.add(Probe::new(key)).unwrap()).collect();
        reused.sort_unstable();
        assert_eq!(reused, (5..15).collect::<Vec<u32>>());
    }

    #[test]
    fn test_blocks_grow_and_trailing_blocks_reclaim() {
        let mut pool = ElementPool::new(64);
        for key in 0..200 {
            pool.add(Probe::new(key)).unwrap();
        }
        assert_eq!(pool.blocks.len(), 4);

        for key in 64..200 {
            pool.remove(key).unwrap();
        }
        // Everything past the first block is garbage; the tail blocks go away.
        assert_eq!(pool.blocks.len(), 1);
        assert_eq!(pool.len(), 64);
    }

    #[test]
    fn test_iteration_in_slot_order() {
        let mut pool = ElementPool::new(64);
        for key in 0..8 {
            pool.add(Probe::new(key)).unwrap();
        }
        pool.remove(3).unwrap();
        let keys: Vec<u64> = pool.iter().map(|probe| probe.key).collect();
        assert_eq!(keys, vec![0, 1, 2, 4, 5, 6, 7]);

        let slots: Vec<u32> = pool.iter().map(|probe| probe.slot.unwrap()).collect();
        assert_eq!(slots, vec![0, 1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_live_bitmap_tracks_membership() {
        let mut pool = ElementPool::new(64);
        for key in 0..4 {
            pool.add(Probe::new(key)).unwrap();
        }
        pool.remove(1).unwrap();
        let live: Vec<u32> = pool.live().iter().collect();
        assert_eq!(live, vec![0, 2, 3]);
    }
}
