//! Stage-1 pre-filter
//!
//! Every (query, reference) location pair of a joined group is scored by the
//! identity count of its fingerprints; pairs reaching `min_identities` pass.
//! The all-vs-all comparison is tiled so a query tile stays in cache while a
//! reference tile streams past it.

pub mod fingerprint;

pub use fingerprint::{Backend, FingerPrint, FINGERPRINT_FLANK, FINGERPRINT_LEN, QUERY_PAD, REFERENCE_PAD};

use crate::core::packed::SeedLoc;

const TILE_QUERIES: usize = 1024;
const TILE_SUBJECTS: usize = 128;
const BLOCK: usize = 6;

/// Load the fingerprints of `locs` into `out` (cleared first).
pub fn load_fingerprints<L: SeedLoc>(data: &[u8], locs: &[L], pad: u8, out: &mut Vec<FingerPrint>) {
    out.clear();
    out.extend(
        locs.iter()
            .map(|l| FingerPrint::load(data, l.pos().get() as usize, pad)),
    );
}

/// Compare every query fingerprint with every subject fingerprint and call
/// `emit(query_index, subject_index)` for pairs with at least
/// `min_identities` equal residues. Returns the number of pairs compared.
pub fn stage1_search<F>(
    queries: &[FingerPrint],
    subjects: &[FingerPrint],
    backend: Backend,
    min_identities: u32,
    mut emit: F,
) -> u64
where
    F: FnMut(usize, usize),
{
    for q0 in (0..queries.len()).step_by(TILE_QUERIES) {
        let q_tile = &queries[q0..(q0 + TILE_QUERIES).min(queries.len())];
        for s0 in (0..subjects.len()).step_by(TILE_SUBJECTS) {
            let s_tile = &subjects[s0..(s0 + TILE_SUBJECTS).min(subjects.len())];
            search_tile(q_tile, s_tile, backend, min_identities, |qi, si| {
                emit(q0 + qi, s0 + si)
            });
        }
    }
    queries.len() as u64 * subjects.len() as u64
}

fn search_tile<F>(
    queries: &[FingerPrint],
    subjects: &[FingerPrint],
    backend: Backend,
    min_identities: u32,
    mut emit: F,
) where
    F: FnMut(usize, usize),
{
    let blocks = queries.len() / BLOCK;
    for b in 0..blocks {
        let qs = &queries[b * BLOCK..(b + 1) * BLOCK];
        for (si, s) in subjects.iter().enumerate() {
            let mut counts = [0u32; BLOCK];
            for (c, q) in counts.iter_mut().zip(qs) {
                *c = backend.match_count(q, s);
            }
            for (k, &c) in counts.iter().enumerate() {
                if c >= min_identities {
                    emit(b * BLOCK + k, si);
                }
            }
        }
    }
    for qi in blocks * BLOCK..queries.len() {
        for (si, s) in subjects.iter().enumerate() {
            if backend.match_count(&queries[qi], s) >= min_identities {
                emit(qi, si);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(q: &[FingerPrint], s: &[FingerPrint], min: u32) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (i, a) in q.iter().enumerate() {
            for (j, b) in s.iter().enumerate() {
                if Backend::Scalar.match_count(a, b) >= min {
                    out.push((i, j));
                }
            }
        }
        out
    }

    fn prints(n: usize, seed: u64, pad: u8) -> Vec<FingerPrint> {
        let mut x = seed;
        (0..n)
            .map(|_| {
                let w: Vec<u8> = (0..FINGERPRINT_LEN)
                    .map(|_| {
                        x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                        ((x >> 33) % 4) as u8
                    })
                    .collect();
                FingerPrint::from_bytes(&w, pad)
            })
            .collect()
    }

    #[test]
    fn test_tiled_search_matches_naive() {
        let q = prints(1031, 1, QUERY_PAD);
        let s = prints(133, 2, REFERENCE_PAD);
        let mut got = Vec::new();
        let compared = stage1_search(&q, &s, Backend::detect(), 15, |i, j| got.push((i, j)));
        assert_eq!(compared, 1031 * 133);
        got.sort_unstable();
        assert_eq!(got, naive(&q, &s, 15));
    }

    #[test]
    fn test_zero_threshold_accepts_all() {
        let q = prints(7, 3, QUERY_PAD);
        let s = prints(2, 4, REFERENCE_PAD);
        let mut n = 0;
        stage1_search(&q, &s, Backend::Scalar, 0, |_, _| n += 1);
        assert_eq!(n, 14);
    }
}
