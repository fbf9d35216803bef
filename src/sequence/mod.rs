//! Concatenated protein sequence collections
//!
//! Records are stored back to back in one letter buffer, each preceded and
//! followed by a delimiter, so a `PackedPosition` is simply a byte offset
//! into that buffer. Lowercase input residues set the soft mask; masked
//! residues never seed.

pub mod seed_mask;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use bio::io::fasta;

use crate::core::packed::{PackedPosition, MAX_POSITION};
use crate::error::{Result, SearchError};
use crate::utils::matrix::{aa_char_to_ncbistdaa, DELIMITER};

pub use seed_mask::SeedMask;

/// Read access the seed/join/extension core needs from a sequence collection.
pub trait SequenceCollection: Sync {
    fn records(&self) -> usize;

    /// Total number of residues, excluding delimiters.
    fn letters(&self) -> u64;

    fn length(&self, record: usize) -> usize;

    /// Packed position of `offset` within `record`.
    fn position(&self, record: usize, offset: usize) -> PackedPosition;

    /// The whole concatenated buffer; index it with `PackedPosition::get`.
    fn data(&self) -> &[u8];

    /// (record, offset) owning a packed position.
    fn local_position(&self, pos: PackedPosition) -> (usize, usize);

    /// External residue mask (low complexity, repeats).
    fn is_masked(&self, _pos: u64) -> bool {
        false
    }

    fn sequence(&self, record: usize) -> &[u8] {
        let start = self.position(record, 0).get() as usize;
        &self.data()[start..start + self.length(record)]
    }
}

/// In-memory sequence collection.
#[derive(Debug, Clone)]
pub struct SequenceSet {
    data: Vec<u8>,
    /// Start of every record, plus one sentinel past the last delimiter.
    limits: Vec<u64>,
    ids: Vec<String>,
    soft_mask: Vec<u64>,
    letters: u64,
}

impl Default for SequenceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceSet {
    pub fn new() -> Self {
        Self {
            data: vec![DELIMITER],
            limits: vec![1],
            ids: Vec::new(),
            soft_mask: vec![0],
            letters: 0,
        }
    }

    /// Append one record of NCBIstdaa letters and return its index.
    pub fn push(&mut self, id: impl Into<String>, letters: &[u8]) -> Result<usize> {
        let end = self.data.len() as u64 + letters.len() as u64 + 1;
        if end > MAX_POSITION {
            return Err(SearchError::PositionOutOfRange {
                pos: end,
                limit: MAX_POSITION,
            });
        }
        self.data.extend_from_slice(letters);
        self.data.push(DELIMITER);
        self.limits.push(self.data.len() as u64);
        self.ids.push(id.into());
        self.letters += letters.len() as u64;
        self.soft_mask.resize(self.data.len().div_ceil(64), 0);
        Ok(self.ids.len() - 1)
    }

    /// Append an ASCII record; lowercase residues are soft-masked.
    pub fn push_ascii(&mut self, id: impl Into<String>, residues: &[u8]) -> Result<usize> {
        let letters: Vec<u8> = residues.iter().map(|&c| aa_char_to_ncbistdaa(c)).collect();
        let record = self.push(id, &letters)?;
        let start = self.limits[record] as usize;
        for (i, c) in residues.iter().enumerate() {
            if c.is_ascii_lowercase() {
                self.set_mask(start + i);
            }
        }
        Ok(record)
    }

    /// Build from ASCII records with generated ids.
    pub fn from_ascii<S: AsRef<[u8]>>(records: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for (i, r) in records.iter().enumerate() {
            set.push_ascii(format!("seq{}", i), r.as_ref())?;
        }
        Ok(set)
    }

    pub fn from_fasta<R: Read>(reader: R) -> AnyResult<Self> {
        let mut set = Self::new();
        for record in fasta::Reader::new(reader).records() {
            let record = record.context("malformed FASTA record")?;
            let id = record.id().split_whitespace().next().unwrap_or("unknown").to_string();
            set.push_ascii(id, record.seq())
                .with_context(|| format!("failed to add record {}", record.id()))?;
        }
        Ok(set)
    }

    pub fn from_fasta_file(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let reader = fasta::Reader::from_file(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let mut set = Self::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("malformed FASTA in {}", path.display()))?;
            let id = record.id().split_whitespace().next().unwrap_or("unknown").to_string();
            set.push_ascii(id, record.seq())?;
        }
        Ok(set)
    }

    pub fn id(&self, record: usize) -> &str {
        &self.ids[record]
    }

    /// Soft-mask `offsets` of `record`.
    pub fn mask_range(&mut self, record: usize, offsets: std::ops::Range<usize>) {
        let start = self.limits[record] as usize;
        let len = self.length(record);
        for off in offsets.start..offsets.end.min(len) {
            self.set_mask(start + off);
        }
    }

    fn set_mask(&mut self, pos: usize) {
        self.soft_mask[pos / 64] |= 1u64 << (pos % 64);
    }
}

impl SequenceCollection for SequenceSet {
    fn records(&self) -> usize {
        self.ids.len()
    }

    fn letters(&self) -> u64 {
        self.letters
    }

    fn length(&self, record: usize) -> usize {
        (self.limits[record + 1] - self.limits[record] - 1) as usize
    }

    fn position(&self, record: usize, offset: usize) -> PackedPosition {
        PackedPosition::from_raw(self.limits[record] + offset as u64)
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn local_position(&self, pos: PackedPosition) -> (usize, usize) {
        let p = pos.get();
        let record = self.limits[..self.ids.len()]
            .partition_point(|&start| start <= p)
            .saturating_sub(1);
        (record, (p - self.limits[record]) as usize)
    }

    fn is_masked(&self, pos: u64) -> bool {
        let pos = pos as usize;
        self.soft_mask
            .get(pos / 64)
            .map(|w| w & (1u64 << (pos % 64)) != 0)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::matrix::ncbistdaa;

    #[test]
    fn test_layout_and_positions() {
        let set = SequenceSet::from_ascii(&["ACD", "", "KL"]).unwrap();
        assert_eq!(set.records(), 3);
        assert_eq!(set.letters(), 5);
        assert_eq!(set.length(0), 3);
        assert_eq!(set.length(1), 0);
        assert_eq!(set.length(2), 2);
        // -ACD--KL-
        assert_eq!(set.data().len(), 9);
        assert_eq!(set.position(0, 0).get(), 1);
        assert_eq!(set.position(2, 1).get(), 7);
        assert_eq!(set.data()[set.position(2, 0).get() as usize], ncbistdaa::K);
        assert_eq!(set.sequence(0), &[ncbistdaa::A, ncbistdaa::C, ncbistdaa::D]);
    }

    #[test]
    fn test_local_position_roundtrip() {
        let set = SequenceSet::from_ascii(&["ACDEF", "GH", "IKLMN"]).unwrap();
        for r in 0..set.records() {
            for off in 0..set.length(r) {
                assert_eq!(set.local_position(set.position(r, off)), (r, off));
            }
        }
    }

    #[test]
    fn test_soft_mask_from_lowercase() {
        let set = SequenceSet::from_ascii(&["ACdeF"]).unwrap();
        let p = |o| set.position(0, o).get();
        assert!(!set.is_masked(p(1)));
        assert!(set.is_masked(p(2)));
        assert!(set.is_masked(p(3)));
        assert!(!set.is_masked(p(4)));
    }

    #[test]
    fn test_gap_character_does_not_split_record() {
        let set = SequenceSet::from_ascii(&["AC-DE"]).unwrap();
        assert_eq!(set.records(), 1);
        assert_eq!(set.length(0), 5);
        assert_eq!(set.sequence(0), &[ncbistdaa::A, ncbistdaa::C, ncbistdaa::X, ncbistdaa::D, ncbistdaa::E][..]);
        assert_eq!(set.local_position(set.position(0, 4)), (0, 4));
        assert_eq!(set.data().iter().filter(|&&c| c == DELIMITER).count(), 2);
    }

    #[test]
    fn test_from_fasta() {
        let fa = b">q1 first\nACDE\nFG\n>q2\nkl\n";
        let set = SequenceSet::from_fasta(&fa[..]).unwrap();
        assert_eq!(set.records(), 2);
        assert_eq!(set.id(0), "q1");
        assert_eq!(set.length(0), 6);
        assert!(set.is_masked(set.position(1, 0).get()));
    }
}
