//! Primary-hit test
//!
//! Neighbouring seeds on one diagonal usually lead to the same alignment.
//! A joined pair is extended only when it is the left-most verified seed
//! hit of its diagonal run under the current shape, and when no earlier
//! shape already produced a verified hit near it.

use crate::align::ungapped::ungapped_window_score;
use crate::seed::index::{KeyEncoding, PartitionRange, Partitioning};
use crate::seed::reduction::Reduction;
use crate::seed::shape::Shape;
use crate::sequence::{SeedMask, SequenceCollection};
use crate::stage1::fingerprint::{Backend, FingerPrint, QUERY_PAD, REFERENCE_PAD};
use crate::utils::matrix::{ScoreMatrix, DELIMITER};

/// Stage-1 and stage-2 checks a pair has to pass to count as a hit.
pub struct Verifier<'a, M: ?Sized> {
    pub backend: Backend,
    pub min_identities: u32,
    pub ungapped_window: usize,
    pub ungapped_xdrop: i32,
    /// 0 disables the ungapped check.
    pub min_ungapped_score: i32,
    pub matrix: &'a M,
}

impl<M: ScoreMatrix + ?Sized> Verifier<'_, M> {
    pub fn fingerprint_ok(&self, q: &[u8], q_pos: usize, s: &[u8], s_pos: usize) -> bool {
        if self.min_identities == 0 {
            return true;
        }
        let a = FingerPrint::load(q, q_pos, QUERY_PAD);
        let b = FingerPrint::load(s, s_pos, REFERENCE_PAD);
        self.backend.match_count(&a, &b) >= self.min_identities
    }

    pub fn ungapped_ok(&self, q: &[u8], q_pos: usize, s: &[u8], s_pos: usize) -> bool {
        if self.min_ungapped_score <= 0 {
            return true;
        }
        let u = ungapped_window_score(
            q,
            q_pos,
            s,
            s_pos,
            self.ungapped_window,
            self.ungapped_xdrop,
            self.matrix,
        );
        u.score >= self.min_ungapped_score
    }

    #[inline]
    pub fn verify(&self, q: &[u8], q_pos: usize, s: &[u8], s_pos: usize) -> bool {
        self.fingerprint_ok(q, q_pos, s, s_pos) && self.ungapped_ok(q, q_pos, s, s_pos)
    }
}

/// Everything needed to decide whether a pair is a primary hit.
pub struct PrimaryHitTest<'a, Q: ?Sized, R: ?Sized, M: ?Sized> {
    pub query: &'a Q,
    pub reference: &'a R,
    pub shapes: &'a [Shape],
    pub encodings: &'a [KeyEncoding],
    pub reduction: &'a Reduction,
    pub partitioning: Partitioning,
    /// Partition range being searched.
    pub range: PartitionRange,
    /// True when the partition space is searched in more than one range.
    pub chunked: bool,
    pub seed_mask: &'a SeedMask,
    pub window: usize,
    pub verifier: &'a Verifier<'a, M>,
}

impl<Q, R, M> PrimaryHitTest<'_, Q, R, M>
where
    Q: SequenceCollection + ?Sized,
    R: SequenceCollection + ?Sized,
    M: ScoreMatrix + ?Sized,
{
    /// True if the seed hit at query position `q_pos` and reference
    /// position `s_pos` (concatenated coordinates) under `shape_id` is the
    /// one to extend.
    pub fn is_primary(&self, q_pos: usize, s_pos: usize, shape_id: usize) -> bool {
        let q = self.query.data();
        let s = self.reference.data();

        for d in 1..=self.window {
            if d > q_pos || d > s_pos {
                break;
            }
            let (qa, sa) = (q_pos - d, s_pos - d);
            if q[qa] == DELIMITER || s[sa] == DELIMITER {
                break;
            }
            if self.previous_shape_collision(qa, sa, shape_id) {
                return false;
            }
            if self.is_seed_hit(qa, sa, shape_id)
                && (!self.chunked || self.partition_of(qa, shape_id).is_some_and(|p| p < self.range.end))
                && self.verifier.verify(q, qa, s, sa)
            {
                return false;
            }
        }

        for d in 1..=self.window {
            let (qa, sa) = (q_pos + d, s_pos + d);
            if qa >= q.len() || sa >= s.len() || q[qa] == DELIMITER || s[sa] == DELIMITER {
                break;
            }
            if self.previous_shape_collision(qa, sa, shape_id) {
                return false;
            }
            if self.chunked
                && self.is_seed_hit(qa, sa, shape_id)
                && self.partition_of(qa, shape_id).is_some_and(|p| p < self.range.begin)
                && self.verifier.verify(q, qa, s, sa)
            {
                return false;
            }
        }
        true
    }

    fn previous_shape_collision(&self, qa: usize, sa: usize, shape_id: usize) -> bool {
        let (q, s) = (self.query.data(), self.reference.data());
        (0..shape_id).any(|k| self.is_seed_hit(qa, sa, k) && self.verifier.verify(q, qa, s, sa))
    }

    /// Both positions start an indexable seed of shape `k` and the seeds match.
    fn is_seed_hit(&self, qa: usize, sa: usize, k: usize) -> bool {
        let shape = &self.shapes[k];
        let (q, s) = (self.query.data(), self.reference.data());
        if !self.seed_mask.searched_under(qa as u64, k) {
            return false;
        }
        if !shape.matches(&q[qa..], &s[sa..], self.reduction) {
            return false;
        }
        !shape.positions().iter().any(|&p| {
            self.query.is_masked((qa + p as usize) as u64)
                || self.reference.is_masked((sa + p as usize) as u64)
        })
    }

    fn partition_of(&self, qa: usize, k: usize) -> Option<usize> {
        let window = &self.query.data()[qa..];
        let packed = self.shapes[k].pack(window, self.reduction)?;
        Some(self.partitioning.partition(self.encodings[k].key(packed)))
    }
}
