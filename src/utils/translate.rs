//! Codon translation for translated (protein vs DNA) extension
//!
//! The 3-frame aligner reads a DNA sequence through a "translated by offset"
//! array: entry `j` is the amino acid of the codon that starts at nucleotide
//! `j`, so all three reading frames are interleaved in one buffer.

use bio::alphabets::dna;

use crate::utils::matrix::{aa_char_to_ncbistdaa, ncbistdaa};

/// Standard genetic code (NCBI table 1), codons in TCAG order.
const STANDARD_CODE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

#[inline]
fn base_index(b: u8) -> Option<usize> {
    match b {
        b'T' | b't' | b'U' | b'u' => Some(0),
        b'C' | b'c' => Some(1),
        b'A' | b'a' => Some(2),
        b'G' | b'g' => Some(3),
        _ => None,
    }
}

/// Translate one codon to NCBIstdaa; codons with ambiguous bases become X.
#[inline]
pub fn translate_codon(b0: u8, b1: u8, b2: u8) -> u8 {
    match (base_index(b0), base_index(b1), base_index(b2)) {
        (Some(x), Some(y), Some(z)) => aa_char_to_ncbistdaa(STANDARD_CODE[x * 16 + y * 4 + z]),
        _ => ncbistdaa::X,
    }
}

/// Amino acid of the codon starting at every nucleotide offset.
///
/// The result has `dna.len() - 2` entries (empty for sequences shorter than a codon).
pub fn translate_by_offset(dna: &[u8]) -> Vec<u8> {
    dna.windows(3)
        .map(|c| translate_codon(c[0], c[1], c[2]))
        .collect()
}

/// Conventional single-frame translation starting at `frame` (0, 1 or 2).
pub fn translate_frame(dna: &[u8], frame: usize) -> Vec<u8> {
    dna.get(frame..)
        .unwrap_or(&[])
        .chunks_exact(3)
        .map(|c| translate_codon(c[0], c[1], c[2]))
        .collect()
}

/// Reverse complement, for extending on the minus strand.
pub fn reverse_strand(dna_seq: &[u8]) -> Vec<u8> {
    dna::revcomp(dna_seq)
}
