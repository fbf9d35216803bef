//! Seed complexity masking
//!
//! A seed's complexity is `ln(w!) - sum(ln(c_i!))` over the counts `c_i` of
//! its reduced letters, i.e. the log of the number of distinct orderings of
//! its letters. Seeds below `seed_cut * ln(2) * weight` are masked.

use crate::core::packed::SeedLoc;
use crate::join::double_array::DoubleArray;
use crate::seed::reduction::Reduction;
use crate::seed::shape::{Shape, MAX_SHAPE_LEN};
use crate::sequence::{SeedMask, SequenceCollection};
use crate::utils::matrix::TRUE_AA;

use super::frequency::MaskCounts;

/// Complexity test for one shape.
#[derive(Debug, Clone)]
pub struct ComplexityFilter {
    cut: f64,
    lnfact: [f64; MAX_SHAPE_LEN + 1],
}

impl ComplexityFilter {
    pub fn new(seed_cut: f64, weight: usize) -> Self {
        let mut lnfact = [0.0f64; MAX_SHAPE_LEN + 1];
        for n in 2..=MAX_SHAPE_LEN {
            lnfact[n] = lnfact[n - 1] + (n as f64).ln();
        }
        Self {
            cut: seed_cut * std::f64::consts::LN_2 * weight as f64,
            lnfact,
        }
    }

    pub fn cut(&self) -> f64 {
        self.cut
    }

    /// Log-multinomial entropy of the seed starting at `window[0]`, or None
    /// if a used letter has no reduced class.
    pub fn entropy(&self, window: &[u8], shape: &Shape, reduction: &Reduction) -> Option<f64> {
        let mut counts = [0usize; TRUE_AA];
        for &p in shape.positions() {
            let class = reduction.map(*window.get(p as usize)?)? as usize;
            counts[class] += 1;
        }
        let mut entropy = self.lnfact[shape.weight()];
        for &c in &counts[..reduction.size().min(TRUE_AA)] {
            entropy -= self.lnfact[c];
        }
        Some(entropy)
    }

    /// True if the seed is complex enough to keep.
    pub fn seed_is_complex(&self, window: &[u8], shape: &Shape, reduction: &Reduction) -> bool {
        self.entropy(window, shape, reduction)
            .map(|e| e >= self.cut)
            .unwrap_or(false)
    }
}

/// Erase groups whose query seed fails the complexity test, marking every
/// query seed start of the group.
#[allow(clippy::too_many_arguments)]
pub fn mask_low_complexity<L, C>(
    query: &mut DoubleArray<L>,
    reference: &mut DoubleArray<L>,
    query_seqs: &C,
    shape: &Shape,
    reduction: &Reduction,
    filter: &ComplexityFilter,
    mask: &SeedMask,
    shape_id: usize,
) -> MaskCounts
where
    L: SeedLoc,
    C: SequenceCollection + ?Sized,
{
    let data = query_seqs.data();
    let mut counts = MaskCounts::default();
    let mut simple = Vec::new();
    for (i, q) in query.iter() {
        counts.groups += 1;
        let Some(first) = q.first() else { continue };
        let start = first.pos().get() as usize;
        let end = (start + shape.length()).min(data.len());
        if filter.seed_is_complex(&data[start..end], shape, reduction) {
            continue;
        }
        for loc in q {
            if mask.mark(loc.pos().get(), shape_id) {
                counts.masked_positions += 1;
            }
        }
        simple.push(i);
    }
    counts.masked_groups = simple.len() as u64;
    for i in simple {
        query.erase(i);
        reference.erase(i);
    }
    counts
}
