/// Gap-free diagonal piece of an alignment.
///
/// `s_start` counts subject units: residues, or nucleotides for translated
/// extension, where the piece covers `len` codons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagonalSegment {
    pub q_start: usize,
    pub s_start: usize,
    pub len: usize,
}

impl DiagonalSegment {
    pub fn new(q_start: usize, s_start: usize, len: usize) -> Self {
        Self { q_start, s_start, len }
    }

    #[inline]
    pub fn q_end(&self) -> usize {
        self.q_start + self.len
    }

    #[inline]
    pub fn s_end(&self, width: usize) -> usize {
        self.s_start + width * self.len
    }
}

/// Result of a seed extension with full statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentResult {
    /// Query start (0-based)
    pub q_start: usize,
    /// Query end (0-based, exclusive)
    pub q_end: usize,
    /// Subject start (0-based; nucleotides for translated extension)
    pub s_start: usize,
    /// Subject end (0-based, exclusive)
    pub s_end: usize,
    /// Raw alignment score
    pub score: i32,
    /// Number of identical positions
    pub matches: usize,
    /// Number of mismatched positions
    pub mismatches: usize,
    /// Number of gap openings
    pub gap_opens: usize,
    /// Number of frameshifts
    pub frameshifts: usize,
    /// Total alignment length (number of columns including gaps)
    pub alignment_len: usize,
    /// Gap-free pieces, query order
    pub segments: Vec<DiagonalSegment>,
    /// Optional edit script for traceback
    pub edit_script: Option<Vec<EditOp>>,
}

impl AlignmentResult {
    /// Assemble a result from ordered segments. `pair(q, s)` returns the
    /// query letter at `q` and the subject letter of the unit starting at `s`.
    pub fn from_segments<F>(
        score: i32,
        segments: Vec<DiagonalSegment>,
        width: usize,
        traceback: bool,
        pair: F,
    ) -> Self
    where
        F: Fn(usize, usize) -> (u8, u8),
    {
        let mut script = Vec::new();
        let mut prev: Option<DiagonalSegment> = None;
        for seg in &segments {
            if let Some(p) = prev {
                push_gap(&mut script, &p, seg, width);
            }
            for t in 0..seg.len {
                let (a, b) = pair(seg.q_start + t, seg.s_start + width * t);
                script.push(if a == b { EditOp::Match } else { EditOp::Mismatch });
            }
            prev = Some(*seg);
        }
        let stats = compute_stats_from_edit_script(&script);
        let (q_start, s_start) = segments.first().map_or((0, 0), |s| (s.q_start, s.s_start));
        let (q_end, s_end) = segments
            .last()
            .map_or((0, 0), |s| (s.q_end(), s.s_end(width)));
        Self {
            q_start,
            q_end,
            s_start,
            s_end,
            score,
            matches: stats.matches,
            mismatches: stats.mismatches,
            gap_opens: stats.gap_opens,
            frameshifts: stats.frameshifts,
            alignment_len: stats.alignment_len,
            segments,
            edit_script: traceback.then_some(script),
        }
    }

    /// Calculate percent identity
    pub fn identity(&self) -> f64 {
        if self.alignment_len == 0 {
            return 0.0;
        }
        100.0 * (self.matches as f64) / (self.alignment_len as f64)
    }

    /// Get the number of gaps (total gap positions, not gap openings)
    pub fn gaps(&self) -> usize {
        self.alignment_len
            .saturating_sub(self.matches + self.mismatches)
    }
}

/// Edit operation for traceback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Match (identical residues)
    Match,
    /// Mismatch (different residues)
    Mismatch,
    /// Insertion in query (gap in subject)
    Ins,
    /// Deletion from query (gap in query)
    Del,
    /// One subject nucleotide skipped
    FrameForward,
    /// One subject nucleotide read twice
    FrameReverse,
}

fn push_gap(script: &mut Vec<EditOp>, prev: &DiagonalSegment, next: &DiagonalSegment, width: usize) {
    let a = next.q_start.saturating_sub(prev.q_end());
    let b = next.s_start as i64 - prev.s_end(width) as i64;
    script.extend(std::iter::repeat(EditOp::Ins).take(a));
    let codons = if width == 3 {
        match b.rem_euclid(3) {
            1 => {
                script.push(EditOp::FrameForward);
                (b - 1) / 3
            }
            2 => {
                script.push(EditOp::FrameReverse);
                (b + 1) / 3
            }
            _ => b / 3,
        }
    } else {
        b
    };
    script.extend(std::iter::repeat(EditOp::Del).take(codons.max(0) as usize));
}

/// Statistics computed from edit script
struct EditStats {
    matches: usize,
    mismatches: usize,
    gap_opens: usize,
    frameshifts: usize,
    alignment_len: usize,
}

/// Compute alignment statistics from edit script
fn compute_stats_from_edit_script(edit_script: &[EditOp]) -> EditStats {
    let mut matches = 0;
    let mut mismatches = 0;
    let mut gap_opens = 0;
    let mut frameshifts = 0;
    let mut alignment_len = 0;
    let mut prev_op: Option<EditOp> = None;

    for &op in edit_script {
        match op {
            EditOp::Match => matches += 1,
            EditOp::Mismatch => mismatches += 1,
            EditOp::Ins | EditOp::Del => {
                if prev_op != Some(op) {
                    gap_opens += 1;
                }
            }
            EditOp::FrameForward | EditOp::FrameReverse => {
                frameshifts += 1;
                prev_op = Some(op);
                continue;
            }
        }
        alignment_len += 1;
        prev_op = Some(op);
    }

    EditStats {
        matches,
        mismatches,
        gap_opens,
        frameshifts,
        alignment_len,
    }
}
