//! Fixed-width residue fingerprints and their identity count
//!
//! A fingerprint is the 48 residues around a seed hit (16 to the left, the
//! seed start and 31 to the right), stored in a 64-byte aligned block.
//! Bytes outside the owning record, and the unused tail, hold a side-specific
//! pad so that query and reference padding never compare equal.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;
use crate::utils::matrix::DELIMITER;

/// Residues compared per pair.
pub const FINGERPRINT_LEN: usize = 48;

/// Residues taken left of the seed start.
pub const FINGERPRINT_FLANK: usize = 16;

const STORAGE: usize = 64;

/// Pad used on the query side.
pub const QUERY_PAD: u8 = 0xFE;

/// Pad used on the reference side.
pub const REFERENCE_PAD: u8 = 0xFF;

#[repr(C, align(64))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FingerPrint {
    bytes: [u8; STORAGE],
}

impl Default for FingerPrint {
    fn default() -> Self {
        Self {
            bytes: [QUERY_PAD; STORAGE],
        }
    }
}

impl fmt::Debug for FingerPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FingerPrint")
            .field(&&self.bytes[..FINGERPRINT_LEN])
            .finish()
    }
}

impl FingerPrint {
    /// Load the window around `pos` from a delimiter-separated buffer.
    pub fn load(data: &[u8], pos: usize, pad: u8) -> Self {
        let mut bytes = [pad; STORAGE];
        // left flank stops at the first delimiter
        let mut i = 0;
        while i < FINGERPRINT_FLANK && pos > i {
            let p = pos - 1 - i;
            if data[p] == DELIMITER {
                break;
            }
            bytes[FINGERPRINT_FLANK - 1 - i] = data[p];
            i += 1;
        }
        let right = FINGERPRINT_LEN - FINGERPRINT_FLANK;
        for j in 0..right {
            match data.get(pos + j) {
                Some(&l) if l != DELIMITER => bytes[FINGERPRINT_FLANK + j] = l,
                _ => break,
            }
        }
        Self { bytes }
    }

    /// Build directly from up to 48 bytes; the rest is padded.
    pub fn from_bytes(window: &[u8], pad: u8) -> Self {
        let mut bytes = [pad; STORAGE];
        let n = window.len().min(FINGERPRINT_LEN);
        bytes[..n].copy_from_slice(&window[..n]);
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; STORAGE] {
        &self.bytes
    }
}

/// Vector width used to count identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Lanes16,
    Lanes32,
    /// Portable SWAR kernel comparing 8 bytes per `u64` word.
    Swar64,
}

impl Backend {
    /// Widest backend supported by the running CPU.
    pub fn detect() -> Backend {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                Backend::Lanes32
            } else {
                Backend::Lanes16
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Backend::Swar64
        }
    }

    /// Backends usable on the running CPU.
    pub fn available() -> Vec<Backend> {
        let mut out = vec![Backend::Scalar, Backend::Lanes16, Backend::Swar64];
        if Backend::Lanes32.is_supported() {
            out.push(Backend::Lanes32);
        }
        out
    }

    pub fn is_supported(self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Backend::Lanes32 => is_x86_feature_detected!("avx2"),
            _ => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Lanes16 => "lanes16",
            Backend::Lanes32 => "lanes32",
            Backend::Swar64 => "swar64",
        }
    }

    /// Number of equal residue pairs among the 48 compared positions.
    #[inline]
    pub fn match_count(self, a: &FingerPrint, b: &FingerPrint) -> u32 {
        match self {
            Backend::Scalar => match_count_scalar(a, b),
            Backend::Lanes16 => match_count_lanes16(a, b),
            Backend::Lanes32 => match_count_lanes32(a, b),
            Backend::Swar64 => match_count_swar(a, b),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(Backend::Scalar),
            "lanes16" | "sse2" => Ok(Backend::Lanes16),
            "lanes32" | "avx2" => Ok(Backend::Lanes32),
            "swar64" | "swar" | "lanes64" => Ok(Backend::Swar64),
            other => Err(SearchError::invalid_config(format!(
                "unknown stage-1 backend {:?}",
                other
            ))),
        }
    }
}

#[inline]
fn match_count_scalar(a: &FingerPrint, b: &FingerPrint) -> u32 {
    a.bytes[..FINGERPRINT_LEN]
        .iter()
        .zip(&b.bytes[..FINGERPRINT_LEN])
        .filter(|(x, y)| x == y)
        .count() as u32
}

const LOW7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

/// Eight bytes per word: the high bit of each zero byte of `a ^ b` survives.
#[inline]
fn match_count_swar(a: &FingerPrint, b: &FingerPrint) -> u32 {
    let mut n = 0;
    for w in 0..FINGERPRINT_LEN / 8 {
        let mut x = [0u8; 8];
        let mut y = [0u8; 8];
        x.copy_from_slice(&a.bytes[w * 8..w * 8 + 8]);
        y.copy_from_slice(&b.bytes[w * 8..w * 8 + 8]);
        let d = u64::from_le_bytes(x) ^ u64::from_le_bytes(y);
        let t = !(((d & LOW7).wrapping_add(LOW7)) | d | LOW7);
        n += t.count_ones();
    }
    n
}

#[inline]
fn match_count_lanes16(a: &FingerPrint, b: &FingerPrint) -> u32 {
    #[cfg(target_arch = "x86_64")]
    {
        // SSE2 is part of the x86_64 baseline
        unsafe { match_count_sse2(a, b) }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        match_count_chunked::<16>(a, b)
    }
}

#[inline]
fn match_count_lanes32(a: &FingerPrint, b: &FingerPrint) -> u32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { match_count_avx2(a, b) };
        }
        unsafe { match_count_sse2(a, b) }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        match_count_chunked::<32>(a, b)
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn match_count_chunked<const N: usize>(a: &FingerPrint, b: &FingerPrint) -> u32 {
    let mut n = 0u32;
    for (x, y) in a.bytes[..FINGERPRINT_LEN]
        .chunks(N)
        .zip(b.bytes[..FINGERPRINT_LEN].chunks(N))
    {
        let mut mask = 0u64;
        for (i, (p, q)) in x.iter().zip(y).enumerate() {
            mask |= ((p == q) as u64) << i;
        }
        n += mask.count_ones();
    }
    n
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn match_count_sse2(a: &FingerPrint, b: &FingerPrint) -> u32 {
    let pa = a.bytes.as_ptr() as *const __m128i;
    let pb = b.bytes.as_ptr() as *const __m128i;
    let mut n = 0u32;
    for i in 0..FINGERPRINT_LEN / 16 {
        let eq = _mm_cmpeq_epi8(_mm_load_si128(pa.add(i)), _mm_load_si128(pb.add(i)));
        n += (_mm_movemask_epi8(eq) as u32).count_ones();
    }
    n
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn match_count_avx2(a: &FingerPrint, b: &FingerPrint) -> u32 {
    let pa = a.bytes.as_ptr();
    let pb = b.bytes.as_ptr();
    let eq = _mm256_cmpeq_epi8(
        _mm256_load_si256(pa as *const __m256i),
        _mm256_load_si256(pb as *const __m256i),
    );
    let low = (_mm256_movemask_epi8(eq) as u32).count_ones();
    let eq = _mm_cmpeq_epi8(
        _mm_load_si128(pa.add(32) as *const __m128i),
        _mm_load_si128(pb.add(32) as *const __m128i),
    );
    low + (_mm_movemask_epi8(eq) as u32).count_ones()
}
