//! Per-residue seed mask written by the frequency and complexity filters
//!
//! Each slot records the shape during which the seed starting at that
//! residue was masked (0 = never). Filters of one shape write concurrently
//! from different partitions; a slot only ever goes from 0 to `shape + 1`.

use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};

pub struct SeedMask {
    slots: Vec<AtomicU8>,
}

impl SeedMask {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mark the seed starting at `pos` as masked during `shape`.
    /// Returns true if this call set the mark.
    pub fn mark(&self, pos: u64, shape: usize) -> bool {
        let tag = (shape as u8).saturating_add(1);
        self.slots[pos as usize]
            .compare_exchange(0, tag, AtomicOrdering::Relaxed, AtomicOrdering::Relaxed)
            .is_ok()
    }

    /// Shape during which `pos` was masked, if any.
    #[inline]
    pub fn masked_at(&self, pos: u64) -> Option<usize> {
        match self.slots.get(pos as usize)?.load(AtomicOrdering::Relaxed) {
            0 => None,
            tag => Some(tag as usize - 1),
        }
    }

    /// True if the seed at `pos` takes part in the search of `shape`.
    #[inline]
    pub fn searched_under(&self, pos: u64, shape: usize) -> bool {
        match self.masked_at(pos) {
            None => true,
            Some(m) => m > shape,
        }
    }

    pub fn count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.load(AtomicOrdering::Relaxed) != 0)
            .count()
    }
}
