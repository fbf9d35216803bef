//! Seed extension driver
//!
//! A seed hit is extended twice: leftwards over reversed copies of both
//! prefixes and rightwards over the suffixes after the seed. The seed's own
//! diagonal is scored without gaps and the three parts are spliced into one
//! `AlignmentResult`; an extension chunk touching the seed is merged into
//! the seed segment.

use crate::align::result::{AlignmentResult, DiagonalSegment};
use crate::align::xdrop::{Chunk, ExtensionMode, GapCosts, GappedXdropAligner, XdropEnd};
use crate::utils::matrix::ScoreMatrix;
use crate::utils::translate::translate_codon;

/// Gapped extension settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionParams {
    pub costs: GapCosts,
    pub xdrop: i32,
    pub mode: ExtensionMode,
    pub traceback: bool,
}

impl Default for ExtensionParams {
    fn default() -> Self {
        Self {
            costs: GapCosts::default(),
            xdrop: 20,
            mode: ExtensionMode::Local,
            traceback: true,
        }
    }
}

/// Aligner plus the oriented sequence buffers it reads.
#[derive(Debug, Default)]
pub struct Extender {
    aligner: GappedXdropAligner,
    seq1: Vec<u8>,
    seq2: Vec<u8>,
}

impl Extender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells_computed(&self) -> u64 {
        self.aligner.cells_computed()
    }

    /// Extend the protein seed `query[q_pos..q_pos+seed_len]` ~
    /// `subject[s_pos..s_pos+seed_len]` in both directions.
    ///
    /// Returns None in overlap mode when either side cannot reach an edge.
    #[allow(clippy::too_many_arguments)]
    pub fn extend_seed<M: ScoreMatrix + ?Sized>(
        &mut self,
        query: &[u8],
        q_pos: usize,
        subject: &[u8],
        s_pos: usize,
        seed_len: usize,
        matrix: &M,
        params: &ExtensionParams,
    ) -> Option<AlignmentResult> {
        if q_pos > query.len() || s_pos > subject.len() {
            return None;
        }
        let seed_len = seed_len.min(query.len() - q_pos).min(subject.len() - s_pos);
        let seed_score: i32 = (0..seed_len)
            .map(|t| matrix.score(query[q_pos + t], subject[s_pos + t]))
            .sum();

        self.seq1.clear();
        self.seq1.extend(query[..q_pos].iter().rev());
        self.seq2.clear();
        self.seq2.extend(subject[..s_pos].iter().rev());
        let left = self.aligner.align(&self.seq1, &self.seq2, matrix, &params.costs, params.xdrop, params.mode)?;
        let left_chunks = self.collect(matrix, params.traceback);

        let (q_right, s_right) = (q_pos + seed_len, s_pos + seed_len);
        let right = self.aligner.align(
            &query[q_right..],
            &subject[s_right..],
            matrix,
            &params.costs,
            params.xdrop,
            params.mode,
        )?;
        let right_chunks = self.collect(matrix, params.traceback);

        let seed = DiagonalSegment::new(q_pos, s_pos, seed_len);
        let score = left.score + seed_score + right.score;
        Some(splice(
            score,
            seed,
            (&left, &left_chunks),
            (&right, &right_chunks),
            1,
            params.traceback,
            |q, s| (query[q], subject[s]),
        ))
    }

    /// Extend a protein seed against DNA: query residue `q_pos + t` is
    /// aligned with the codon at nucleotide `nt_pos + 3t`. Subject
    /// coordinates of the result are nucleotides.
    #[allow(clippy::too_many_arguments)]
    pub fn extend_translated<M: ScoreMatrix + ?Sized>(
        &mut self,
        query: &[u8],
        q_pos: usize,
        dna: &[u8],
        nt_pos: usize,
        seed_len: usize,
        matrix: &M,
        params: &ExtensionParams,
    ) -> Option<AlignmentResult> {
        if q_pos > query.len() || nt_pos > dna.len() {
            return None;
        }
        let seed_len = seed_len.min(query.len() - q_pos).min((dna.len() - nt_pos) / 3);
        let codon = |p: usize| translate_codon(dna[p], dna[p + 1], dna[p + 2]);
        let seed_score: i32 = (0..seed_len)
            .map(|t| matrix.score(query[q_pos + t], codon(nt_pos + 3 * t)))
            .sum();

        // leftwards: unit p is the codon ending p nucleotides before the anchor
        self.seq1.clear();
        self.seq1.extend(query[..q_pos].iter().rev());
        self.seq2.clear();
        self.seq2
            .extend((0..nt_pos.saturating_sub(2)).map(|p| codon(nt_pos - p - 3)));
        let left = self.aligner.align3(
            &self.seq1,
            &self.seq2,
            nt_pos,
            matrix,
            &params.costs,
            params.xdrop,
            params.mode,
        )?;
        let left_chunks = self.collect(matrix, params.traceback);

        let (q_right, nt_right) = (q_pos + seed_len, nt_pos + 3 * seed_len);
        self.seq2.clear();
        self.seq2
            .extend((nt_right..dna.len().saturating_sub(2)).map(codon));
        let right = self.aligner.align3(
            &query[q_right..],
            &self.seq2,
            dna.len() - nt_right,
            matrix,
            &params.costs,
            params.xdrop,
            params.mode,
        )?;
        let right_chunks = self.collect(matrix, params.traceback);

        let seed = DiagonalSegment::new(q_pos, nt_pos, seed_len);
        let score = left.score + seed_score + right.score;
        Some(splice(
            score,
            seed,
            (&left, &left_chunks),
            (&right, &right_chunks),
            3,
            params.traceback,
            |q, s| (query[q], codon(s)),
        ))
    }

    fn collect<M: ScoreMatrix + ?Sized>(&mut self, matrix: &M, traceback: bool) -> Vec<Chunk> {
        if traceback {
            self.aligner.chunks(matrix)
        } else {
            Vec::new()
        }
    }
}

/// Extend with a throwaway `Extender`.
#[allow(clippy::too_many_arguments)]
pub fn extend_seed<M: ScoreMatrix + ?Sized>(
    query: &[u8],
    q_pos: usize,
    subject: &[u8],
    s_pos: usize,
    seed_len: usize,
    matrix: &M,
    params: &ExtensionParams,
) -> Option<AlignmentResult> {
    Extender::new().extend_seed(query, q_pos, subject, s_pos, seed_len, matrix, params)
}

/// Translated counterpart of `extend_seed`.
#[allow(clippy::too_many_arguments)]
pub fn extend_translated<M: ScoreMatrix + ?Sized>(
    query: &[u8],
    q_pos: usize,
    dna: &[u8],
    nt_pos: usize,
    seed_len: usize,
    matrix: &M,
    params: &ExtensionParams,
) -> Option<AlignmentResult> {
    Extender::new().extend_translated(query, q_pos, dna, nt_pos, seed_len, matrix, params)
}

fn splice<F>(
    score: i32,
    seed: DiagonalSegment,
    left: (&XdropEnd, &[Chunk]),
    right: (&XdropEnd, &[Chunk]),
    width: usize,
    traceback: bool,
    pair: F,
) -> AlignmentResult
where
    F: Fn(usize, usize) -> (u8, u8),
{
    let (left_end, left_chunks) = left;
    let (right_end, right_chunks) = right;
    let q_begin = seed.q_start - left_end.end1;
    let s_begin = seed.s_start - left_end.end2;
    let q_finish = seed.q_end() + right_end.end1;
    let s_finish = seed.s_end(width) + right_end.end2;

    if !traceback {
        return AlignmentResult {
            q_start: q_begin,
            q_end: q_finish,
            s_start: s_begin,
            s_end: s_finish,
            score,
            matches: 0,
            mismatches: 0,
            gap_opens: 0,
            frameshifts: 0,
            alignment_len: 0,
            segments: Vec::new(),
            edit_script: None,
        };
    }

    // far-to-near on the left is already query order
    let mut segments: Vec<DiagonalSegment> = left_chunks
        .iter()
        .map(|c| DiagonalSegment::new(seed.q_start - c.end1, seed.s_start - c.end2, c.len))
        .collect();

    let mut core = seed;
    if let Some(last) = segments.last() {
        if last.q_end() == core.q_start && last.s_end(width) == core.s_start {
            core = DiagonalSegment::new(last.q_start, last.s_start, last.len + core.len);
            segments.pop();
        }
    }
    let right_base = (seed.q_end(), seed.s_end(width));
    let mut right_segments = right_chunks
        .iter()
        .rev()
        .map(|c| DiagonalSegment::new(right_base.0 + c.start1(), right_base.1 + c.start2(width), c.len))
        .peekable();
    if let Some(first) = right_segments.peek() {
        if first.q_start == core.q_end() && first.s_start == core.s_end(width) {
            core.len += first.len;
            right_segments.next();
        }
    }
    segments.push(core);
    segments.extend(right_segments);

    AlignmentResult::from_segments(score, segments, width, true, pair)
}
