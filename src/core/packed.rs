//! Packed sequence positions
//!
//! A position is an offset into the concatenated letter buffer of one
//! sequence collection. Offsets are limited to 40 bits; when a caller needs
//! the owning record without a binary search, a 32-bit block id travels
//! alongside the offset in bits 40..72 of a 128-bit word.

use std::fmt;

use crate::error::{Result, SearchError};

/// Number of bits available for a position.
pub const POSITION_BITS: u32 = 40;

/// Largest encodable position.
pub const MAX_POSITION: u64 = (1u64 << POSITION_BITS) - 1;

const BLOCK_ID_SHIFT: u32 = POSITION_BITS;
const BLOCK_ID_MASK: u128 = 0xFFFF_FFFF;

/// 40-bit offset into a concatenated sequence collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackedPosition(u64);

impl PackedPosition {
    pub fn new(pos: u64) -> Result<Self> {
        if pos > MAX_POSITION {
            return Err(SearchError::PositionOutOfRange {
                pos,
                limit: MAX_POSITION,
            });
        }
        Ok(Self(pos))
    }

    /// Encode a position already known to fit, masking off anything above 40 bits.
    #[inline]
    pub(crate) fn from_raw(pos: u64) -> Self {
        debug_assert!(pos <= MAX_POSITION);
        Self(pos & MAX_POSITION)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Byte distance from `earlier`; both positions must come from the same collection.
    #[inline]
    pub fn offset_from(self, earlier: PackedPosition) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }
}

impl fmt::Display for PackedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position plus owning block (record) id, packed into one integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackedPositionId(u128);

impl PackedPositionId {
    pub fn new(pos: u64, block_id: u32) -> Result<Self> {
        let pos = PackedPosition::new(pos)?;
        Ok(Self::from_parts(pos, block_id))
    }

    #[inline]
    pub fn from_parts(pos: PackedPosition, block_id: u32) -> Self {
        Self(pos.0 as u128 | ((block_id as u128) << BLOCK_ID_SHIFT))
    }

    #[inline]
    pub fn pos(self) -> PackedPosition {
        PackedPosition((self.0 as u64) & MAX_POSITION)
    }

    #[inline]
    pub fn block_id(self) -> u32 {
        ((self.0 >> BLOCK_ID_SHIFT) & BLOCK_ID_MASK) as u32
    }
}

/// Location type stored in seed indices and join outputs.
pub trait SeedLoc: Copy + Send + Sync + Default + fmt::Debug + 'static {
    /// Build a location for `offset` within record `block_id` starting at `pos`.
    fn make(pos: PackedPosition, block_id: u32) -> Self;

    fn pos(self) -> PackedPosition;

    /// Owning record, when the location carries it.
    fn block_id(self) -> Option<u32>;
}

impl SeedLoc for PackedPosition {
    #[inline]
    fn make(pos: PackedPosition, _block_id: u32) -> Self {
        pos
    }

    #[inline]
    fn pos(self) -> PackedPosition {
        self
    }

    #[inline]
    fn block_id(self) -> Option<u32> {
        None
    }
}

impl SeedLoc for PackedPositionId {
    #[inline]
    fn make(pos: PackedPosition, block_id: u32) -> Self {
        PackedPositionId::from_parts(pos, block_id)
    }

    #[inline]
    fn pos(self) -> PackedPosition {
        PackedPositionId::pos(self)
    }

    #[inline]
    fn block_id(self) -> Option<u32> {
        Some(PackedPositionId::block_id(self))
    }
}
