//! Exhaustive seed-neighborhood enumeration
//!
//! The neighborhood of a seed is every seed over the standard amino acids
//! whose summed substitution score against it reaches a threshold.

use crate::utils::matrix::{ScoreMatrix, STANDARD_AA};

/// Call `f` with every neighbor of `seed` scoring at least `threshold`, in
/// lexicographic order of NCBIstdaa codes. Returns the number of neighbors.
pub fn for_each_neighbor<M, F>(seed: &[u8], matrix: &M, threshold: i32, mut f: F) -> usize
where
    M: ScoreMatrix + ?Sized,
    F: FnMut(&[u8], i32),
{
    let n = seed.len();
    if n == 0 {
        return 0;
    }
    // best_rest[i]: highest score achievable by positions i..n
    let mut best_rest = vec![0i32; n + 1];
    for i in (0..n).rev() {
        let best = STANDARD_AA
            .iter()
            .map(|&b| matrix.score(seed[i], b))
            .max()
            .unwrap_or(0);
        best_rest[i] = best_rest[i + 1] + best;
    }
    if best_rest[0] < threshold {
        return 0;
    }

    let mut current = vec![0u8; n];
    let mut choice = vec![0usize; n];
    let mut partial = vec![0i32; n + 1];
    let mut count = 0usize;
    let mut depth = 0usize;

    loop {
        if choice[depth] == STANDARD_AA.len() {
            if depth == 0 {
                break;
            }
            choice[depth] = 0;
            depth -= 1;
            choice[depth] += 1;
            continue;
        }
        let letter = STANDARD_AA[choice[depth]];
        let score = partial[depth] + matrix.score(seed[depth], letter);
        if score + best_rest[depth + 1] < threshold {
            choice[depth] += 1;
            continue;
        }
        current[depth] = letter;
        partial[depth + 1] = score;
        if depth + 1 == n {
            f(&current, score);
            count += 1;
            choice[depth] += 1;
        } else {
            depth += 1;
        }
    }
    count
}

/// Collect the neighborhood into owned seeds.
pub fn neighborhood<M: ScoreMatrix + ?Sized>(seed: &[u8], matrix: &M, threshold: i32) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    for_each_neighbor(seed, matrix, threshold, |s, _| out.push(s.to_vec()));
    out
}
