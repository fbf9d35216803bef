//! Search driver
//!
//! For every shape, and every range of partitions within it:
//!
//! 1. Build the query and reference seed indices for the range.
//! 2. Join every partition and sample its group sizes.
//! 3. Mask frequent and low-complexity seed groups.
//! 4. Run the fingerprint filter over each group, keep primary hits and
//!    extend them.
//!
//! Phases are separated by full barriers; partitions inside a phase are
//! pulled from an atomic cursor by the pool workers.

pub mod collision;
pub mod hit;
pub mod pool;
pub mod stats;
pub mod workset;

pub use collision::{PrimaryHitTest, Verifier};
pub use hit::{by_diagonal, by_query, by_query_subject, by_subject, Hit};
pub use pool::PartitionPool;
pub use stats::{diagnostics_enabled, Stat, Statistics};
pub use workset::WorkSet;

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use anyhow::Context;
use log::{debug, info};

use crate::align::splice::ExtensionParams;
use crate::config::SearchConfig;
use crate::core::packed::{PackedPosition, PackedPositionId, SeedLoc};
use crate::error::Result;
use crate::filter::{
    mask_frequent, mask_low_complexity, merge_slots, ComplexityFilter, FrequencySampler, MaskCounts,
};
use crate::join::{hash_join, DoubleArray, JoinConfig};
use crate::seed::{IndexParams, KeyEncoding, NoFilter, PartitionRange, Partitioning, Reduction, SeedIndex, Shape};
use crate::sequence::{SeedMask, SequenceCollection};
use crate::stage1::{load_fingerprints, stage1_search, Backend, QUERY_PAD, REFERENCE_PAD};
use crate::utils::matrix::ScoreMatrix;

/// A seed pair that survived masking, the fingerprint filter and the
/// primary-hit test, before gapped extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedMatch {
    pub shape_id: u32,
    pub query_id: u32,
    /// Query offset of the seed start.
    pub query_offset: u32,
    /// Reference position of the seed start.
    pub subject: PackedPosition,
    pub target_block_id: u32,
    /// Offset of the seed start within the reference record.
    pub subject_offset: u32,
}

#[derive(Debug, Default)]
pub struct SearchOutput {
    pub hits: Vec<Hit>,
    pub stats: Statistics,
}

/// Search `query` against `reference` and extend every primary seed hit.
pub fn run_search<Q, R, M>(
    query: &Q,
    reference: &R,
    matrix: &M,
    config: &SearchConfig,
) -> anyhow::Result<SearchOutput>
where
    Q: SequenceCollection + ?Sized,
    R: SequenceCollection + ?Sized,
    M: ScoreMatrix + ?Sized,
{
    let collected = dispatch(query, reference, matrix, config, Output::Hits)?;
    Ok(SearchOutput {
        hits: collected.hits,
        stats: collected.stats,
    })
}

/// Run the seed stages only and return the pairs an extension strategy
/// would receive.
pub fn seed_matches<Q, R, M>(
    query: &Q,
    reference: &R,
    matrix: &M,
    config: &SearchConfig,
) -> anyhow::Result<(Vec<SeedMatch>, Statistics)>
where
    Q: SequenceCollection + ?Sized,
    R: SequenceCollection + ?Sized,
    M: ScoreMatrix + ?Sized,
{
    let collected = dispatch(query, reference, matrix, config, Output::SeedMatches)?;
    Ok((collected.matches, collected.stats))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Hits,
    SeedMatches,
}

#[derive(Default)]
struct Collected {
    hits: Vec<Hit>,
    matches: Vec<SeedMatch>,
    stats: Statistics,
}

fn dispatch<Q, R, M>(
    query: &Q,
    reference: &R,
    matrix: &M,
    config: &SearchConfig,
    output: Output,
) -> anyhow::Result<Collected>
where
    Q: SequenceCollection + ?Sized,
    R: SequenceCollection + ?Sized,
    M: ScoreMatrix + ?Sized,
{
    config.validate().context("invalid search configuration")?;
    let driver = Driver::new(query, reference, matrix, config, output)?;
    let collected = if config.resolve_block_ids {
        driver.run::<PackedPositionId>()
    } else {
        driver.run::<PackedPosition>()
    }
    .context("seed search failed")?;

    collected.stats.log_summary();
    if diagnostics_enabled() {
        collected.stats.print_summary();
    }
    Ok(collected)
}

/// Join output of one partition.
#[derive(Default)]
struct Joined<L> {
    query: DoubleArray<L>,
    reference: DoubleArray<L>,
}

struct Driver<'a, Q: ?Sized, R: ?Sized, M: ?Sized> {
    query: &'a Q,
    reference: &'a R,
    matrix: &'a M,
    config: &'a SearchConfig,
    output: Output,
    reduction: Reduction,
    shapes: Vec<Shape>,
    encodings: Vec<KeyEncoding>,
    partitioning: Partitioning,
    ranges: Vec<PartitionRange>,
    seed_mask: SeedMask,
    backend: Backend,
    join: JoinConfig,
    extension: ExtensionParams,
}

impl<'a, Q, R, M> Driver<'a, Q, R, M>
where
    Q: SequenceCollection + ?Sized,
    R: SequenceCollection + ?Sized,
    M: ScoreMatrix + ?Sized,
{
    fn new(
        query: &'a Q,
        reference: &'a R,
        matrix: &'a M,
        config: &'a SearchConfig,
        output: Output,
    ) -> anyhow::Result<Self> {
        let reduction = Reduction::new(&config.reduction)
            .with_context(|| format!("bad reduction {:?}", config.reduction))?;
        let shapes = config
            .shapes
            .iter()
            .map(|code| Shape::new(code).with_context(|| format!("bad shape {:?}", code)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let encodings = shapes
            .iter()
            .map(|s| KeyEncoding::select(s, &reduction, config.key_bit_budget))
            .collect::<Result<Vec<_>>>()?;
        let partitioning = Partitioning::new(config.partition_bits)?;
        let ranges = PartitionRange::all(&partitioning).split(config.index_chunks);
        let backend = config.stage1_backend.resolve()?;

        for (shape, enc) in shapes.iter().zip(&encodings) {
            debug!(
                "shape {} weight={} key_bits={} hashed={}",
                shape.code(),
                shape.weight(),
                enc.key_bits(),
                enc.is_hashed()
            );
        }

        Ok(Self {
            query,
            reference,
            matrix,
            config,
            output,
            reduction,
            shapes,
            encodings,
            partitioning,
            ranges,
            seed_mask: SeedMask::new(query.data().len()),
            backend,
            join: config.join_config(),
            extension: config.extension_params(),
        })
    }

    fn run<L: SeedLoc>(&self) -> Result<Collected> {
        let pool = PartitionPool::new(self.config.threads)?;
        info!(
            "searching {} query letters against {} reference letters: {} shape(s), {} partitions, {} chunk(s), {} threads, stage 1 {}",
            self.query.letters(),
            self.reference.letters(),
            self.shapes.len(),
            self.partitioning.count(),
            self.ranges.len(),
            pool.threads(),
            self.backend
        );

        let mut out = Collected::default();
        for shape_id in 0..self.shapes.len() {
            info!("shape {}/{} ({})", shape_id + 1, self.shapes.len(), self.shapes[shape_id].code());
            for &range in &self.ranges {
                self.search_range::<L>(&pool, shape_id, range, &mut out)?;
            }
        }
        Ok(out)
    }

    fn search_range<L: SeedLoc>(
        &self,
        pool: &PartitionPool,
        shape_id: usize,
        range: PartitionRange,
        out: &mut Collected,
    ) -> Result<()> {
        let shape = &self.shapes[shape_id];
        let n = range.len();

        // Index
        let timer = Instant::now();
        let params = IndexParams {
            shape,
            shape_id,
            reduction: &self.reduction,
            encoding: self.encodings[shape_id],
            partitioning: self.partitioning,
            range,
            seed_mask: Some(&self.seed_mask),
            threads: pool.threads(),
        };
        let ref_params = IndexParams {
            seed_mask: None,
            ..params
        };
        let (query_index, ref_index) = pool.install(|| -> Result<(SeedIndex<L>, SeedIndex<L>)> {
            Ok((
                SeedIndex::build(self.query, &params, &NoFilter)?,
                SeedIndex::build(self.reference, &ref_params, &NoFilter)?,
            ))
        })?;
        out.stats.add(Stat::QuerySeeds, query_index.len() as u64);
        out.stats.add(Stat::ReferenceSeeds, ref_index.len() as u64);
        out.stats.add(
            Stat::SeedsMaskedAtIndex,
            query_index.stats().masked + ref_index.stats().masked,
        );
        out.stats.add_time(Stat::TimeIndexMicros, timer.elapsed());

        // Join and sample
        let timer = Instant::now();
        let states = pool.run(
            n,
            |_| Vec::new(),
            |done: &mut Vec<(usize, Joined<L>, FrequencySampler)>, i| {
                let p = range.begin + i;
                let (query, reference) = hash_join(query_index.partition(p), ref_index.partition(p), &self.join)?;
                let mut sampler = FrequencySampler::new();
                sampler.sample(&query, &reference);
                done.push((i, Joined { query, reference }, sampler));
                Ok(())
            },
        )?;
        drop(query_index);
        drop(ref_index);

        let mut slots = vec![FrequencySampler::new(); n];
        let mut parts: Vec<Option<Joined<L>>> = (0..n).map(|_| None).collect();
        for (i, joined, sampler) in states.into_iter().flatten() {
            slots[i] = sampler;
            parts[i] = Some(joined);
        }
        let joined: Vec<Mutex<Joined<L>>> = parts
            .into_iter()
            .map(|j| Mutex::new(j.unwrap_or_default()))
            .collect();
        let groups: usize = joined
            .iter()
            .map(|j| j.lock().unwrap_or_else(PoisonError::into_inner).query.group_count())
            .sum();
        out.stats.add(Stat::JoinedGroups, groups as u64);
        out.stats.add_time(Stat::TimeJoinMicros, timer.elapsed());

        // Mask
        let timer = Instant::now();
        let sample = merge_slots(&slots);
        let cap = self.config.freq_masking.then(|| sample.cap(self.config.freq_sd));
        debug!(
            "shape {} partitions {}..{}: {} groups, product mean {:.2} sd {:.2} cap {:?}",
            shape_id,
            range.begin,
            range.end,
            sample.count(),
            sample.mean(),
            sample.sd(),
            cap
        );
        let complexity = ComplexityFilter::new(self.config.seed_cut, shape.weight());
        let masked = pool.run(
            n,
            |_| (MaskCounts::default(), MaskCounts::default()),
            |acc: &mut (MaskCounts, MaskCounts), i| {
                let (frequent, simple) = acc;
                let mut guard = joined[i].lock().unwrap_or_else(PoisonError::into_inner);
                let Joined { query, reference } = &mut *guard;
                if let Some(cap) = cap {
                    *frequent += mask_frequent(query, reference, cap, &self.seed_mask, shape_id);
                }
                *simple += mask_low_complexity(
                    query,
                    reference,
                    self.query,
                    shape,
                    &self.reduction,
                    &complexity,
                    &self.seed_mask,
                    shape_id,
                );
                Ok(())
            },
        )?;
        for (frequent, simple) in masked {
            out.stats.add(Stat::FrequencyMaskedGroups, frequent.masked_groups);
            out.stats.add(Stat::FrequencyMaskedPositions, frequent.masked_positions);
            out.stats.add(Stat::ComplexityMaskedGroups, simple.masked_groups);
            out.stats.add(Stat::ComplexityMaskedPositions, simple.masked_positions);
        }
        out.stats.add_time(Stat::TimeMaskMicros, timer.elapsed());

        // Stage 1 and extension
        let timer = Instant::now();
        let verifier = Verifier {
            backend: self.backend,
            min_identities: self.config.min_identities,
            ungapped_window: self.config.ungapped_window,
            ungapped_xdrop: self.config.ungapped_xdrop,
            min_ungapped_score: self.config.min_ungapped_score,
            matrix: self.matrix,
        };
        let test = PrimaryHitTest {
            query: self.query,
            reference: self.reference,
            shapes: &self.shapes,
            encodings: &self.encodings,
            reduction: &self.reduction,
            partitioning: self.partitioning,
            range,
            chunked: self.ranges.len() > 1,
            seed_mask: &self.seed_mask,
            window: self.config.collision_window,
            verifier: &verifier,
        };
        let worksets = pool.run(n, WorkSet::new, |ws, i| {
            let guard = joined[i].lock().unwrap_or_else(PoisonError::into_inner);
            self.search_partition(ws, &guard, &test, shape_id);
            Ok(())
        })?;
        let mut emitted = 0usize;
        for ws in worksets {
            out.stats.merge(&ws.stats);
            emitted += ws.hits.len() + ws.matches.len();
            out.hits.extend(ws.hits);
            out.matches.extend(ws.matches);
        }
        out.stats.add_time(Stat::TimeSearchMicros, timer.elapsed());
        debug!(
            "shape {} partitions {}..{}: {} groups joined, {} emitted",
            shape_id, range.begin, range.end, groups, emitted
        );
        Ok(())
    }

    fn search_partition<L: SeedLoc>(
        &self,
        ws: &mut WorkSet,
        joined: &Joined<L>,
        test: &PrimaryHitTest<'_, Q, R, M>,
        shape_id: usize,
    ) {
        for (g, query_locs) in joined.query.iter() {
            let Some(ref_locs) = joined.reference.get(g) else {
                continue;
            };
            ws.stats.add(Stat::SeedHits, (query_locs.len() * ref_locs.len()) as u64);
            load_fingerprints(self.query.data(), query_locs, QUERY_PAD, &mut ws.query_prints);
            load_fingerprints(self.reference.data(), ref_locs, REFERENCE_PAD, &mut ws.reference_prints);
            ws.pairs.clear();
            let pairs = &mut ws.pairs;
            let compared = stage1_search(
                &ws.query_prints,
                &ws.reference_prints,
                self.backend,
                self.config.min_identities,
                |qi, si| pairs.push((qi as u32, si as u32)),
            );
            ws.stats.add(Stat::Stage1Compared, compared);
            ws.stats.add(Stat::Stage1Passed, ws.pairs.len() as u64);
            for k in 0..ws.pairs.len() {
                let (qi, si) = ws.pairs[k];
                self.search_pair(ws, query_locs[qi as usize], ref_locs[si as usize], test, shape_id);
            }
        }
    }

    fn search_pair<L: SeedLoc>(
        &self,
        ws: &mut WorkSet,
        query_loc: L,
        ref_loc: L,
        test: &PrimaryHitTest<'_, Q, R, M>,
        shape_id: usize,
    ) {
        let q_pos = query_loc.pos().get() as usize;
        let s_pos = ref_loc.pos().get() as usize;
        let (q_rec, q_off) = locate(self.query, query_loc);
        let (s_rec, s_off) = locate(self.reference, ref_loc);

        if self.config.skip_self && q_rec == s_rec {
            ws.stats.inc(Stat::SelfHitsSkipped);
            return;
        }
        if !test.is_primary(q_pos, s_pos, shape_id) {
            ws.stats.inc(Stat::CollisionRejected);
            return;
        }
        if !test
            .verifier
            .ungapped_ok(self.query.data(), q_pos, self.reference.data(), s_pos)
        {
            ws.stats.inc(Stat::UngappedRejected);
            return;
        }

        if self.output == Output::SeedMatches {
            ws.matches.push(SeedMatch {
                shape_id: shape_id as u32,
                query_id: q_rec as u32,
                query_offset: q_off as u32,
                subject: ref_loc.pos(),
                target_block_id: s_rec as u32,
                subject_offset: s_off as u32,
            });
            return;
        }

        ws.stats.inc(Stat::GappedExtensions);
        let before = ws.extender.cells_computed();
        let result = ws.extender.extend_seed(
            self.query.sequence(q_rec),
            q_off,
            self.reference.sequence(s_rec),
            s_off,
            self.shapes[shape_id].length(),
            self.matrix,
            &self.extension,
        );
        ws.stats.add(Stat::ExtensionCells, ws.extender.cells_computed() - before);
        match result {
            Some(alignment) if alignment.score >= self.config.min_score => {
                ws.stats.inc(Stat::HitsEmitted);
                ws.hits.push(Hit {
                    query_id: q_rec as u32,
                    subject: ref_loc.pos(),
                    seed_offset: q_off as u32,
                    score: alignment.score,
                    target_block_id: s_rec as u32,
                    alignment,
                });
            }
            _ => ws.stats.inc(Stat::LowScoreRejected),
        }
    }
}

/// (record, offset) of a seed location, from its block id when it carries one.
fn locate<C, L>(seqs: &C, loc: L) -> (usize, usize)
where
    C: SequenceCollection + ?Sized,
    L: SeedLoc,
{
    match loc.block_id() {
        Some(block) => {
            let block = block as usize;
            let start = seqs.position(block, 0).get();
            (block, (loc.pos().get() - start) as usize)
        }
        None => seqs.local_position(loc.pos()),
    }
}
