//! Partitioned seed index
//!
//! Seeds are packed into integer keys (exact, or hashed when the exact key
//! space exceeds the key-bit budget). The low `partition_bits` of a key pick
//! its partition; the remaining bits are the join key stored in the index.
//! Every partition's entries are contiguous and sorted by key.

use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use xxhash_rust::xxh3::xxh3_64;

use crate::core::packed::SeedLoc;
use crate::error::{try_with_capacity, Result, SearchError};
use crate::join::radix::carve;
use crate::join::relation::{Relation, SeedEntry};
use crate::seed::reduction::Reduction;
use crate::seed::shape::Shape;
use crate::sequence::{SeedMask, SequenceCollection};

/// How packed seeds become keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// The packed seed itself; `key_bits` = ceil(log2(reduction^weight)).
    Exact { key_bits: u32 },
    /// A 64-bit hash of the packed seed truncated to `key_bits`.
    Hashed { key_bits: u32 },
}

impl KeyEncoding {
    /// Exact keys when the key space fits the budget, hashed keys otherwise.
    pub fn select(shape: &Shape, reduction: &Reduction, key_bit_budget: u32) -> Result<Self> {
        if key_bit_budget == 0 || key_bit_budget > 64 {
            return Err(SearchError::invalid_config(format!(
                "key bit budget {} outside 1..=64",
                key_bit_budget
            )));
        }
        let space = shape.key_space(reduction)?;
        let bits = ceil_log2(space);
        if bits <= key_bit_budget {
            Ok(KeyEncoding::Exact { key_bits: bits })
        } else {
            Ok(KeyEncoding::Hashed {
                key_bits: key_bit_budget,
            })
        }
    }

    #[inline]
    pub fn key_bits(&self) -> u32 {
        match *self {
            KeyEncoding::Exact { key_bits } | KeyEncoding::Hashed { key_bits } => key_bits,
        }
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self, KeyEncoding::Hashed { .. })
    }

    #[inline]
    pub fn key(&self, packed: u64) -> u64 {
        match *self {
            KeyEncoding::Exact { .. } => packed,
            KeyEncoding::Hashed { key_bits } => xxh3_64(&packed.to_le_bytes()) & low_mask(key_bits),
        }
    }
}

#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn ceil_log2(n: u128) -> u32 {
    if n <= 1 {
        0
    } else {
        128 - (n - 1).leading_zeros()
    }
}

/// Splits the key space into `2^bits` partitions by the low key bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioning {
    bits: u32,
}

impl Partitioning {
    pub fn new(bits: u32) -> Result<Self> {
        if bits > 16 {
            return Err(SearchError::invalid_config(format!(
                "partition bits {} exceeds 16",
                bits
            )));
        }
        Ok(Self { bits })
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn count(&self) -> usize {
        1usize << self.bits
    }

    #[inline(always)]
    pub fn partition(&self, key: u64) -> usize {
        (key & low_mask(self.bits)) as usize
    }

    #[inline(always)]
    pub fn offset(&self, key: u64) -> u64 {
        key >> self.bits
    }

    /// Key bits left for joining once the partition bits are removed.
    pub fn join_bits(&self, encoding: &KeyEncoding) -> u32 {
        encoding.key_bits().saturating_sub(self.bits)
    }
}

/// Half-open range of partition ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRange {
    pub begin: usize,
    pub end: usize,
}

impl PartitionRange {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn all(p: &Partitioning) -> Self {
        Self::new(0, p.count())
    }

    #[inline]
    pub fn contains(&self, partition: usize) -> bool {
        partition >= self.begin && partition < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// Split into `chunks` contiguous ranges of near-equal size.
    pub fn split(&self, chunks: usize) -> Vec<PartitionRange> {
        let chunks = chunks.clamp(1, self.len().max(1));
        (0..chunks)
            .map(|i| {
                PartitionRange::new(
                    self.begin + self.len() * i / chunks,
                    self.begin + self.len() * (i + 1) / chunks,
                )
            })
            .collect()
    }
}

/// Additional per-seed acceptance test applied while indexing.
pub trait SeedFilter: Sync {
    fn accept(&self, window: &[u8], key: u64) -> bool;
}

/// Accepts every seed.
pub struct NoFilter;

impl SeedFilter for NoFilter {
    #[inline]
    fn accept(&self, _window: &[u8], _key: u64) -> bool {
        true
    }
}

/// Accepts only keys present in a set (hash-membership filter).
pub struct KeySetFilter {
    keys: FxHashSet<u64>,
}

impl KeySetFilter {
    pub fn new(keys: impl IntoIterator<Item = u64>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SeedFilter for KeySetFilter {
    #[inline]
    fn accept(&self, _window: &[u8], key: u64) -> bool {
        self.keys.contains(&key)
    }
}

/// Inputs for `SeedIndex::build`.
#[derive(Clone, Copy)]
pub struct IndexParams<'a> {
    pub shape: &'a Shape,
    pub shape_id: usize,
    pub reduction: &'a Reduction,
    pub encoding: KeyEncoding,
    pub partitioning: Partitioning,
    pub range: PartitionRange,
    /// Seed starts masked by filters of earlier shapes.
    pub seed_mask: Option<&'a SeedMask>,
    pub threads: usize,
}

/// Seed counts gathered while indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedIndexStats {
    /// Seed windows fully inside a record.
    pub considered: u64,
    /// Skipped because a residue was soft-masked or the seed start was masked.
    pub masked: u64,
    /// Skipped because a used letter was degenerate.
    pub degenerate: u64,
    /// Rejected by the seed filter.
    pub filtered: u64,
    /// Indexed (in range).
    pub indexed: u64,
}

impl std::ops::AddAssign for SeedIndexStats {
    fn add_assign(&mut self, o: Self) {
        self.considered += o.considered;
        self.masked += o.masked;
        self.degenerate += o.degenerate;
        self.filtered += o.filtered;
        self.indexed += o.indexed;
    }
}

/// Seed entries for a range of partitions.
pub struct SeedIndex<L> {
    entries: Vec<SeedEntry<L>>,
    /// limits[i]..limits[i+1] holds partition `range.begin + i`.
    limits: Vec<usize>,
    range: PartitionRange,
    join_bits: u32,
    stats: SeedIndexStats,
}

impl<L: SeedLoc> SeedIndex<L> {
    pub fn build<C, F>(seqs: &C, params: &IndexParams<'_>, filter: &F) -> Result<Self>
    where
        C: SequenceCollection + ?Sized,
        F: SeedFilter + ?Sized,
    {
        let range = params.range;
        let chunks = record_chunks(seqs, params.threads.max(1) * 4);

        let counted: Vec<(Vec<usize>, SeedIndexStats)> = chunks
            .par_iter()
            .map(|records| {
                let mut hist = vec![0usize; range.len()];
                let mut stats = SeedIndexStats::default();
                for_each_seed(seqs, records.clone(), params, filter, &mut stats, |p, _: SeedEntry<L>| {
                    hist[p - range.begin] += 1;
                });
                (hist, stats)
            })
            .collect();

        let mut stats = SeedIndexStats::default();
        let mut counts = Vec::with_capacity(counted.len());
        for (hist, s) in counted {
            stats += s;
            counts.push(hist);
        }

        let mut limits = Vec::with_capacity(range.len() + 1);
        limits.push(0usize);
        for p in 0..range.len() {
            let n: usize = counts.iter().map(|h| h[p]).sum();
            limits.push(limits[p] + n);
        }
        let total = limits[range.len()];

        let mut entries: Vec<SeedEntry<L>> = try_with_capacity(total, "seed index")?;
        entries.resize(total, SeedEntry::default());

        let targets = carve(&mut entries, &counts);
        chunks
            .par_iter()
            .zip(targets.into_par_iter())
            .for_each(|(records, mut slots)| {
                let mut fill = vec![0usize; range.len()];
                let mut scratch = SeedIndexStats::default();
                for_each_seed(seqs, records.clone(), params, filter, &mut scratch, |p, e| {
                    let b = p - range.begin;
                    slots[b][fill[b]] = e;
                    fill[b] += 1;
                });
            });

        let mut parts: Vec<&mut [SeedEntry<L>]> = Vec::with_capacity(range.len());
        let mut rest = entries.as_mut_slice();
        for w in limits.windows(2) {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(w[1] - w[0]);
            parts.push(head);
            rest = tail;
        }
        parts.into_par_iter().for_each(|p| p.sort_by_key(|e| e.key));

        debug!(
            "seed index shape={} partitions={}..{} entries={} masked={} degenerate={}",
            params.shape_id, range.begin, range.end, total, stats.masked, stats.degenerate
        );

        Ok(Self {
            entries,
            limits,
            range,
            join_bits: params.partitioning.join_bits(&params.encoding),
            stats,
        })
    }

    /// Entries of partition `p` (absolute id, must lie in the index range).
    pub fn partition(&self, p: usize) -> Relation<'_, SeedEntry<L>> {
        let i = p - self.range.begin;
        Relation::new(&self.entries[self.limits[i]..self.limits[i + 1]], self.join_bits)
    }

    pub fn partition_len(&self, p: usize) -> usize {
        let i = p - self.range.begin;
        self.limits[i + 1] - self.limits[i]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn range(&self) -> PartitionRange {
        self.range
    }

    pub fn join_bits(&self) -> u32 {
        self.join_bits
    }

    pub fn stats(&self) -> SeedIndexStats {
        self.stats
    }
}

/// Contiguous record ranges of roughly equal letter count.
fn record_chunks<C: SequenceCollection + ?Sized>(seqs: &C, chunks: usize) -> Vec<Range<usize>> {
    let n = seqs.records();
    if n == 0 {
        return Vec::new();
    }
    let target = (seqs.letters() / chunks.max(1) as u64).max(1);
    let mut out = Vec::with_capacity(chunks);
    let mut begin = 0usize;
    let mut acc = 0u64;
    for r in 0..n {
        acc += seqs.length(r) as u64;
        if acc >= target {
            out.push(begin..r + 1);
            begin = r + 1;
            acc = 0;
        }
    }
    if begin < n {
        out.push(begin..n);
    }
    out
}

/// Enumerate the indexable seeds of `records`, calling `f(partition, entry)`
/// for those whose partition lies in the range.
fn for_each_seed<C, F, L, G>(
    seqs: &C,
    records: Range<usize>,
    params: &IndexParams<'_>,
    filter: &F,
    stats: &mut SeedIndexStats,
    mut f: G,
) where
    C: SequenceCollection + ?Sized,
    F: SeedFilter + ?Sized,
    L: SeedLoc,
    G: FnMut(usize, SeedEntry<L>),
{
    let shape = params.shape;
    let span = shape.length();
    for record in records {
        let len = seqs.length(record);
        if len < span {
            continue;
        }
        let seq = seqs.sequence(record);
        let start = seqs.position(record, 0).get();
        for off in 0..=len - span {
            stats.considered += 1;
            let pos = start + off as u64;
            if let Some(mask) = params.seed_mask {
                if !mask.searched_under(pos, params.shape_id) {
                    stats.masked += 1;
                    continue;
                }
            }
            if shape
                .positions()
                .iter()
                .any(|&p| seqs.is_masked(pos + p as u64))
            {
                stats.masked += 1;
                continue;
            }
            let window = &seq[off..off + span];
            let packed = match shape.pack(window, params.reduction) {
                Some(k) => k,
                None => {
                    stats.degenerate += 1;
                    continue;
                }
            };
            let key = params.encoding.key(packed);
            let partition = params.partitioning.partition(key);
            if !params.range.contains(partition) {
                continue;
            }
            if !filter.accept(window, key) {
                stats.filtered += 1;
                continue;
            }
            stats.indexed += 1;
            let loc = L::make(seqs.position(record, off), record as u32);
            f(partition, SeedEntry::new(params.partitioning.offset(key), loc));
        }
    }
}
