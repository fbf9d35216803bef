//! Join inputs: keyed records and read-only relation views

use crate::core::packed::SeedLoc;
use crate::error::{Result, SearchError};

/// A record that can take part in a radix-cluster / hash join.
pub trait JoinRecord: Copy + Send + Sync + Default {
    type Value: Copy + Send + Sync + Default;

    fn key(&self) -> u64;

    fn value(&self) -> Self::Value;
}

/// Extract `bits` key bits starting at `shift`.
#[derive(Debug, Clone, Copy)]
pub struct ExtractBits {
    shift: u32,
    mask: u64,
}

impl ExtractBits {
    /// Extractor for a power-of-two bucket count `n` (n == 1 extracts nothing).
    pub fn new(n: u64, shift: u32) -> Self {
        debug_assert!(n.is_power_of_two());
        Self {
            shift,
            mask: n - 1,
        }
    }

    pub fn with_bits(bits: u32, shift: u32) -> Self {
        let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
        Self { shift, mask }
    }

    #[inline(always)]
    pub fn apply(&self, key: u64) -> usize {
        (key.checked_shr(self.shift).unwrap_or(0) & self.mask) as usize
    }
}

/// Seed index entry: key (partition bits removed) and seed location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeedEntry<L> {
    pub key: u64,
    pub loc: L,
}

impl<L> SeedEntry<L> {
    pub fn new(key: u64, loc: L) -> Self {
        Self { key, loc }
    }
}

impl<L: SeedLoc> JoinRecord for SeedEntry<L> {
    type Value = L;

    #[inline(always)]
    fn key(&self) -> u64 {
        self.key
    }

    #[inline(always)]
    fn value(&self) -> L {
        self.loc
    }
}

/// Non-owning view of one relation (one side of one partition).
#[derive(Debug, Clone, Copy)]
pub struct Relation<'a, T> {
    data: &'a [T],
    key_bits: u32,
}

impl<'a, T> Relation<'a, T> {
    pub fn new(data: &'a [T], key_bits: u32) -> Self {
        Self { data, key_bits }
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of significant key bits.
    #[inline]
    pub fn key_bits(&self) -> u32 {
        self.key_bits
    }
}

/// Both sides of a join must agree on key width.
pub fn check_key_widths<T>(r: &Relation<'_, T>, s: &Relation<'_, T>) -> Result<u32> {
    if r.key_bits != s.key_bits {
        return Err(SearchError::KeyWidthMismatch {
            left: r.key_bits,
            right: s.key_bits,
        });
    }
    Ok(r.key_bits)
}
