//! Spaced seed shapes and seed packing

use crate::error::{Result, SearchError};
use crate::seed::reduction::Reduction;

/// Longest supported shape (span and weight).
pub const MAX_SHAPE_LEN: usize = 32;

/// A spaced seed: positions marked '1' in the shape code take part in the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    code: String,
    positions: Vec<u32>,
    /// Bit i set if position i is used.
    mask: u64,
    length: usize,
}

impl Shape {
    /// Parse a 0/1 shape code such as `"1101011"`.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() || code.len() > MAX_SHAPE_LEN {
            return Err(SearchError::invalid_shape(format!(
                "shape {:?} must span 1..={} positions",
                code, MAX_SHAPE_LEN
            )));
        }
        if !code.starts_with('1') || !code.ends_with('1') {
            return Err(SearchError::invalid_shape(format!(
                "shape {:?} must start and end with a used position",
                code
            )));
        }
        let mut positions = Vec::new();
        let mut mask = 0u64;
        for (i, c) in code.bytes().enumerate() {
            match c {
                b'1' => {
                    positions.push(i as u32);
                    mask |= 1u64 << i;
                }
                b'0' => {}
                _ => {
                    return Err(SearchError::invalid_shape(format!(
                        "shape {:?} contains {:?}",
                        code, c as char
                    )))
                }
            }
        }
        if positions.len() > MAX_SHAPE_LEN {
            return Err(SearchError::SeedWeightTooLarge {
                weight: positions.len(),
                max: MAX_SHAPE_LEN,
            });
        }
        Ok(Self {
            code: code.to_string(),
            positions,
            mask,
            length: code.len(),
        })
    }

    /// Contiguous shape of the given weight.
    pub fn contiguous(weight: usize) -> Result<Self> {
        if weight > MAX_SHAPE_LEN {
            return Err(SearchError::SeedWeightTooLarge {
                weight,
                max: MAX_SHAPE_LEN,
            });
        }
        Self::new(&"1".repeat(weight))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Span in residues.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of used positions.
    #[inline]
    pub fn weight(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Size of the exact key space (`reduction^weight`), or an error if it
    /// does not fit in 64 bits.
    pub fn key_space(&self, reduction: &Reduction) -> Result<u128> {
        let space = (reduction.size() as u128).checked_pow(self.weight() as u32);
        match space {
            Some(s) if s <= u64::MAX as u128 + 1 => Ok(s),
            _ => Err(SearchError::SeedWeightTooLarge {
                weight: self.weight(),
                max: max_weight_for(reduction),
            }),
        }
    }

    /// Pack the seed whose first residue is `window[0]`.
    ///
    /// Returns None if the window is too short or any used letter is degenerate.
    #[inline]
    pub fn pack(&self, window: &[u8], reduction: &Reduction) -> Option<u64> {
        if window.len() < self.length {
            return None;
        }
        let base = reduction.size() as u64;
        let mut key = 0u64;
        for &p in &self.positions {
            let r = reduction.map(window[p as usize])?;
            key = key.wrapping_mul(base).wrapping_add(r as u64);
        }
        Some(key)
    }

    /// True if the used positions of both windows have equal reduced letters.
    #[inline]
    pub fn matches(&self, a: &[u8], b: &[u8], reduction: &Reduction) -> bool {
        if a.len() < self.length || b.len() < self.length {
            return false;
        }
        self.positions.iter().all(|&p| {
            let p = p as usize;
            match (reduction.map(a[p]), reduction.map(b[p])) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        })
    }
}

/// Largest weight whose exact key space still fits in 64 bits.
pub fn max_weight_for(reduction: &Reduction) -> usize {
    let base = reduction.size() as u128;
    let mut w = 0usize;
    let mut space = 1u128;
    while w < MAX_SHAPE_LEN && space * base <= u64::MAX as u128 + 1 {
        space *= base;
        w += 1;
    }
    w
}
