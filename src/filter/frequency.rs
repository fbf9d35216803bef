//! Seed frequency masking
//!
//! Every partition samples the match-count products `|query group| *
//! |reference group|` of its joined groups into its own slot. After all
//! partitions are sampled, the slots are merged and the cap is
//! `floor(mean + k * sd)`. Groups whose product exceeds the cap are erased
//! and their query seed starts are marked in the seed mask.

use crate::core::packed::SeedLoc;
use crate::join::double_array::DoubleArray;
use crate::sequence::SeedMask;

/// Running moments of match-count products for one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrequencySampler {
    n: u64,
    sum: f64,
    sum_sq: f64,
}

impl FrequencySampler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, product: u64) {
        let x = product as f64;
        self.n += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Sample every live group pair of one partition's join output.
    pub fn sample<V>(&mut self, query: &DoubleArray<V>, reference: &DoubleArray<V>) {
        for (i, q) in query.iter() {
            let r = reference.raw_count(i);
            self.add(q.len() as u64 * r as u64);
        }
    }

    pub fn merge(&mut self, other: &FrequencySampler) {
        self.n += other.n;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }

    /// Population standard deviation.
    pub fn sd(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.n as f64 - mean * mean).max(0.0).sqrt()
    }

    /// Largest retained match-count product.
    pub fn cap(&self, freq_sd: f64) -> u64 {
        (self.mean() + freq_sd * self.sd()).floor().max(0.0) as u64
    }
}

/// Merge per-partition slots into one sampler.
pub fn merge_slots(slots: &[FrequencySampler]) -> FrequencySampler {
    slots.iter().fold(FrequencySampler::new(), |mut acc, s| {
        acc.merge(s);
        acc
    })
}

/// Counts reported by one masking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskCounts {
    /// Joined groups examined.
    pub groups: u64,
    /// Groups erased.
    pub masked_groups: u64,
    /// Query seed starts newly marked.
    pub masked_positions: u64,
}

impl std::ops::AddAssign for MaskCounts {
    fn add_assign(&mut self, o: Self) {
        self.groups += o.groups;
        self.masked_groups += o.masked_groups;
        self.masked_positions += o.masked_positions;
    }
}

/// Erase groups whose product exceeds `cap`, marking their query seeds.
pub fn mask_frequent<L: SeedLoc>(
    query: &mut DoubleArray<L>,
    reference: &mut DoubleArray<L>,
    cap: u64,
    mask: &SeedMask,
    shape_id: usize,
) -> MaskCounts {
    let mut counts = MaskCounts::default();
    let mut frequent = Vec::new();
    for (i, q) in query.iter() {
        counts.groups += 1;
        let product = q.len() as u64 * reference.raw_count(i) as u64;
        if product > cap {
            for loc in q {
                if mask.mark(loc.pos().get(), shape_id) {
                    counts.masked_positions += 1;
                }
            }
            frequent.push(i);
        }
    }
    counts.masked_groups = frequent.len() as u64;
    for i in frequent {
        query.erase(i);
        reference.erase(i);
    }
    counts
}
