//! Radix clustering
//!
//! Entries are scattered into `2^bits` clusters by key bits
//! `[shift, shift + bits)`. The returned histogram holds the end offset of
//! every cluster, so cluster `i` occupies `hist[i-1]..hist[i]` of the output.
//! Scatter is stable: entries keep their input order within a cluster.

use rayon::prelude::*;

use crate::join::relation::{ExtractBits, JoinRecord};

/// Cluster `src` into `dst` (same length). Returns cluster end offsets.
pub fn radix_cluster<T: JoinRecord>(src: &[T], shift: u32, bits: u32, dst: &mut [T]) -> Vec<usize> {
    debug_assert_eq!(src.len(), dst.len());
    let clusters = 1usize << bits;
    let key = ExtractBits::with_bits(bits, shift);

    let mut hist = vec![0usize; clusters];
    for e in src {
        hist[key.apply(e.key())] += 1;
    }

    let mut next = vec![0usize; clusters];
    let mut sum = 0usize;
    for (n, h) in next.iter_mut().zip(&hist) {
        *n = sum;
        sum += h;
    }

    for e in src {
        let c = key.apply(e.key());
        dst[next[c]] = *e;
        next[c] += 1;
    }
    next
}

/// Two-pass parallel radix clustering.
///
/// Each of `parts` slices of `src` builds a private histogram; the
/// histograms are prefix-summed cluster-major, and every slice then scatters
/// into its own pre-assigned ranges of `dst`. Produces exactly the layout of
/// `radix_cluster`.
pub fn radix_cluster_parallel<T: JoinRecord>(
    src: &[T],
    shift: u32,
    bits: u32,
    dst: &mut [T],
    parts: usize,
) -> Vec<usize> {
    debug_assert_eq!(src.len(), dst.len());
    let parts = parts.max(1);
    if parts == 1 || src.len() < parts * 64 {
        return radix_cluster(src, shift, bits, dst);
    }
    let clusters = 1usize << bits;
    let key = ExtractBits::with_bits(bits, shift);
    let chunk_len = src.len().div_ceil(parts);
    let chunks: Vec<&[T]> = src.chunks(chunk_len).collect();

    let counts: Vec<Vec<usize>> = chunks
        .par_iter()
        .map(|chunk| {
            let mut h = vec![0usize; clusters];
            for e in chunk.iter() {
                h[key.apply(e.key())] += 1;
            }
            h
        })
        .collect();

    let mut ends = vec![0usize; clusters];
    let mut sum = 0usize;
    for (c, end) in ends.iter_mut().enumerate() {
        sum += counts.iter().map(|h| h[c]).sum::<usize>();
        *end = sum;
    }

    let targets = carve(dst, &counts);
    chunks
        .into_par_iter()
        .zip(targets.into_par_iter())
        .for_each(|(chunk, mut slots)| {
            let mut fill = vec![0usize; clusters];
            for e in chunk {
                let c = key.apply(e.key());
                slots[c][fill[c]] = *e;
                fill[c] += 1;
            }
        });
    ends
}

/// Split `buf` into per-part, per-bucket slices.
///
/// `counts[part][bucket]` sizes the pieces; the buffer is laid out bucket by
/// bucket, and within a bucket part by part. Output is indexed `[part][bucket]`.
pub(crate) fn carve<'a, T>(mut buf: &'a mut [T], counts: &[Vec<usize>]) -> Vec<Vec<&'a mut [T]>> {
    let parts = counts.len();
    let buckets = counts.first().map_or(0, |c| c.len());
    let mut out: Vec<Vec<&'a mut [T]>> = (0..parts).map(|_| Vec::with_capacity(buckets)).collect();
    for b in 0..buckets {
        for p in 0..parts {
            let (head, tail) = std::mem::take(&mut buf).split_at_mut(counts[p][b]);
            out[p].push(head);
            buf = tail;
        }
    }
    out
}

/// Start offset of cluster `i` given end offsets.
#[inline]
pub fn cluster_start(ends: &[usize], i: usize) -> usize {
    if i == 0 {
        0
    } else {
        ends[i - 1]
    }
}
