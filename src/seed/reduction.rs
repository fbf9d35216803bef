//! Reduced amino acid alphabets for seed packing

use crate::error::{Result, SearchError};
use crate::utils::matrix::{aa_char_to_ncbistdaa, is_standard, ALPHABET_SIZE};

/// 11-letter reduction used by default: Murphy's 10-letter alphabet with W
/// split off from the aromatic class.
pub const DEFAULT_REDUCTION: &str = "A KR EDNQ C G H ILVM FY W P ST";

const NONE: u8 = u8::MAX;

/// Maps NCBIstdaa letters to reduced classes. Letters outside every class
/// (ambiguity codes, stop, delimiter) have no class and never seed.
#[derive(Debug, Clone)]
pub struct Reduction {
    map: [u8; ALPHABET_SIZE],
    size: usize,
    definition: String,
}

impl Reduction {
    /// Parse a whitespace-separated list of letter groups, e.g. `"KR EDNQ C"`.
    pub fn new(definition: &str) -> Result<Self> {
        let mut map = [NONE; ALPHABET_SIZE];
        let mut size = 0usize;
        for group in definition.split_whitespace() {
            for c in group.bytes() {
                let letter = aa_char_to_ncbistdaa(c);
                if !is_standard(letter) {
                    return Err(SearchError::invalid_config(format!(
                        "reduction {:?} uses non-standard residue {:?}",
                        definition, c as char
                    )));
                }
                if map[letter as usize] != NONE {
                    return Err(SearchError::invalid_config(format!(
                        "residue {:?} appears twice in reduction {:?}",
                        c as char, definition
                    )));
                }
                map[letter as usize] = size as u8;
            }
            size += 1;
        }
        if size < 2 {
            return Err(SearchError::invalid_config(format!(
                "reduction {:?} needs at least two classes",
                definition
            )));
        }
        Ok(Self {
            map,
            size,
            definition: definition.to_string(),
        })
    }

    pub fn default_protein() -> Self {
        Self::new(DEFAULT_REDUCTION).unwrap_or_else(|_| unreachable!("default reduction is valid"))
    }

    /// Reduced class of `letter`, or None for degenerate letters.
    #[inline(always)]
    pub fn map(&self, letter: u8) -> Option<u8> {
        match self.map.get(letter as usize) {
            Some(&c) if c != NONE => Some(c),
            _ => None,
        }
    }

    /// Number of classes (the packing base).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bits needed to store one reduced letter.
    pub fn bit_size(&self) -> u32 {
        usize::BITS - (self.size - 1).leading_zeros()
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

impl Default for Reduction {
    fn default() -> Self {
        Self::default_protein()
    }
}
