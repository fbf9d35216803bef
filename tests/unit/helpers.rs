//! Reference implementations used by the property tests.

use std::collections::BTreeMap;

use proptest::prelude::*;
use seedjoin::align::{Chunk, GapCosts};
use seedjoin::core::PackedPosition;
use seedjoin::join::{DoubleArray, SeedEntry};
use seedjoin::utils::matrix::{ScoreMatrix, STANDARD_AA};
use seedjoin::utils::translate::translate_frame;

/// Bits of a test location that hold the entry index; the key sits above.
pub const INDEX_BITS: u32 = 16;

pub fn entry(key: u64, index: usize) -> SeedEntry<PackedPosition> {
    let loc = PackedPosition::new((key << INDEX_BITS) | index as u64).unwrap();
    SeedEntry::new(key, loc)
}

pub fn key_of(loc: PackedPosition) -> u64 {
    loc.get() >> INDEX_BITS
}

/// Input index an `entry` was built from.
pub fn index_of(loc: PackedPosition) -> u64 {
    loc.get() & ((1 << INDEX_BITS) - 1)
}

/// key -> (sorted R locations, sorted S locations) for every key on both sides.
pub type Grouped = BTreeMap<u64, (Vec<u64>, Vec<u64>)>;

pub fn naive_join(r: &[SeedEntry<PackedPosition>], s: &[SeedEntry<PackedPosition>]) -> Grouped {
    let mut left: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for e in r {
        left.entry(e.key).or_default().push(e.loc.get());
    }
    let mut right: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for e in s {
        right.entry(e.key).or_default().push(e.loc.get());
    }
    let mut out = Grouped::new();
    for (k, mut a) in left {
        if let Some(mut b) = right.remove(&k) {
            a.sort_unstable();
            b.sort_unstable();
            out.insert(k, (a, b));
        }
    }
    out
}

/// Regroup join output by key, checking that every group is key-homogeneous
/// and that no key shows up in two groups.
pub fn regroup(out_r: &DoubleArray<PackedPosition>, out_s: &DoubleArray<PackedPosition>) -> Grouped {
    assert_eq!(out_r.group_count(), out_s.group_count());
    let mut out = Grouped::new();
    for (i, group_r) in out_r.iter() {
        let group_s = out_s.get(i).expect("groups are erased on both sides together");
        assert!(!group_r.is_empty() && !group_s.is_empty());
        let key = key_of(group_r[0]);
        assert!(group_r.iter().chain(group_s).all(|&l| key_of(l) == key));
        let mut a: Vec<u64> = group_r.iter().map(|l| l.get()).collect();
        let mut b: Vec<u64> = group_s.iter().map(|l| l.get()).collect();
        a.sort_unstable();
        b.sort_unstable();
        assert!(out.insert(key, (a, b)).is_none(), "key {} joined twice", key);
    }
    out
}

/// Best score of any alignment anchored at the origin of both sequences,
/// with the affine gap model `open + len * extend`.
pub fn full_dp_score<M: ScoreMatrix>(a: &[u8], b: &[u8], matrix: &M, costs: &GapCosts) -> i32 {
    full_dp_units(a, b, b.len(), 1, matrix, costs)
}

/// Full-matrix reference for the X-drop recurrences. Column `j` counts
/// seq2 units; with `width == 3` they are nucleotides, `units2[p]` is the
/// codon starting at `p`, and a pair may also skip or reuse one nucleotide
/// at the cost of a frameshift. Gaps may swallow a pair of residues at
/// the `unaligned` cost.
pub fn full_dp_units<M: ScoreMatrix>(
    a: &[u8],
    units2: &[u8],
    len2: usize,
    width: usize,
    matrix: &M,
    costs: &GapCosts,
) -> i32 {
    const NEG: i64 = i64::MIN / 4;
    let (n, m, w) = (a.len(), len2, width);
    let (open, ext) = (costs.open as i64, costs.extend as i64);
    let (unaligned, fs) = (costs.unaligned as i64, costs.frameshift as i64);
    let mut best_cell = vec![vec![NEG; m + 1]; n + 1];
    let mut y = vec![vec![NEG; m + 1]; n + 1];
    let mut z = vec![vec![NEG; m + 1]; n + 1];
    best_cell[0][0] = 0;
    let mut best = 0i64;
    for i in 0..=n {
        for j in 0..=m {
            if i == 0 && j == 0 {
                continue;
            }
            let mut x = NEG;
            if i > 0 && j >= w {
                let s = matrix.score(a[i - 1], units2[j - w]) as i64;
                x = best_cell[i - 1][j - w] + s;
                if w == 3 {
                    if j > w {
                        x = x.max(best_cell[i - 1][j - w - 1] - fs + s);
                    }
                    x = x.max(best_cell[i - 1][j - w + 1] - fs + s);
                }
            }
            if i > 0 {
                y[i][j] = (best_cell[i - 1][j] - open - ext).max(y[i - 1][j] - ext);
                if j >= w {
                    y[i][j] = y[i][j].max(y[i - 1][j - w] - unaligned);
                }
            }
            if j >= w {
                z[i][j] = (best_cell[i][j - w] - open - ext).max(z[i][j - w] - ext);
                if i > 0 {
                    z[i][j] = z[i][j].max(z[i - 1][j - w] - unaligned);
                }
            }
            best_cell[i][j] = x.max(y[i][j]).max(z[i][j]).max(NEG);
            best = best.max(best_cell[i][j]);
        }
    }
    best as i32
}

/// Score of the path described by traceback chunks (far to near), ending
/// at `end`, under the affine gap model. Between chunks the path may take
/// one gap on each side; a shifted chunk pays one frameshift.
pub fn rescore_chunks<M: ScoreMatrix>(
    a: &[u8],
    units2: &[u8],
    width: usize,
    chunks: &[Chunk],
    end: (usize, usize),
    matrix: &M,
    costs: &GapCosts,
) -> i32 {
    let gap = |len: usize| if len == 0 { 0 } else { costs.open + costs.extend * len as i32 };
    let mut score = 0;
    let mut prev = (0usize, 0usize);
    for c in chunks.iter().rev() {
        let (s1, s2) = (c.start1(), c.start2(width));
        // cell the chunk's first pair steps from
        let from2 = (s2 as i64 - c.shift as i64) as usize;
        assert!(s1 >= prev.0 && from2 >= prev.1, "chunks overlap");
        let skipped = from2 - prev.1;
        assert_eq!(skipped % width, 0, "gap leaves the reading frame");
        score -= gap(s1 - prev.0) + gap(skipped / width);
        if c.shift != 0 {
            score -= costs.frameshift;
        }
        score += (0..c.len).map(|t| matrix.score(a[s1 + t], units2[s2 + width * t])).sum::<i32>();
        prev = (c.end1, c.end2);
    }
    assert_eq!(prev, end, "traceback does not reach the end cell");
    score
}

pub fn protein(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(STANDARD_AA.to_vec()), 0..max_len)
}

/// A copy of `base` with a few substitutions, insertions and deletions.
pub fn mutated(base: Vec<u8>) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    let len = base.len();
    prop::collection::vec((0..len.max(1), 0u8..3, prop::sample::select(STANDARD_AA.to_vec())), 0..4)
        .prop_map(move |edits| {
            let mut copy = base.clone();
            for (at, kind, letter) in edits {
                let at = at.min(copy.len());
                match kind {
                    0 if at < copy.len() => copy[at] = letter,
                    1 => copy.insert(at, letter),
                    2 if at < copy.len() => {
                        copy.remove(at);
                    }
                    _ => {}
                }
            }
            (base.clone(), copy)
        })
}

pub fn dna(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 0..max_len)
}

/// A protein translated from frame 0 of some DNA, paired with that DNA
/// after a few single-nucleotide insertions, deletions and substitutions.
pub fn coding(max_len: usize) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (
        dna(max_len),
        prop::collection::vec((0..max_len.max(1), 0u8..3, prop::sample::select(b"ACGT".to_vec())), 0..4),
    )
        .prop_map(|(nt, edits)| {
            let protein = translate_frame(&nt, 0);
            let mut copy = nt;
            for (at, kind, base) in edits {
                let at = at.min(copy.len());
                match kind {
                    0 if at < copy.len() => copy[at] = base,
                    1 => copy.insert(at, base),
                    2 if at < copy.len() => {
                        copy.remove(at);
                    }
                    _ => {}
                }
            }
            (protein, copy)
        })
}
