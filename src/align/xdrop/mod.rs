//! Gapped X-drop extension over antidiagonals
//!
//! Extends an alignment from the origin (0, 0) of two oriented sequences,
//! seq1 (protein residues) and seq2 (protein residues, or the amino acids
//! of every codon start of a DNA strand when `width == 3`). Per cell:
//!
//! ```text
//! X(i,j) = B(i-1, j-w) + s(seq1[i-1], units2[j-w])
//!          [3-frame: also B(i-1, j-w-1) - fs + s  and  B(i-1, j-w+1) - fs + s]
//! Y(i,j) = max(B(i-1, j) - open - ext, Y(i-1, j) - ext, Y(i-1, j-w) - unaligned)
//! Z(i,j) = max(B(i, j-w) - open - ext, Z(i, j-w) - ext, Z(i-1, j-w) - unaligned)
//! B(i,j) = max(X, Y, Z)
//! ```
//!
//! Cells whose B falls more than `xdrop` below the best score seen on any
//! earlier antidiagonal are pruned. Traceback re-derives every step from
//! score equalities; no pointer matrix is kept.

pub mod arena;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SearchError};
use crate::utils::matrix::ScoreMatrix;

use arena::Arena;

/// Score of an unreachable or pruned cell.
pub const NEG_INF: i32 = i32::MIN / 2;

/// Largest accepted cost or drop value.
pub const MAX_COST: i32 = i32::MAX / 4;

/// Gap penalties. A gap of length L costs `open + L * extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapCosts {
    pub open: i32,
    pub extend: i32,
    /// Cost of a pair of residues left unaligned inside a gap.
    pub unaligned: i32,
    /// Cost of a frameshift in 3-frame extension.
    pub frameshift: i32,
}

impl Default for GapCosts {
    fn default() -> Self {
        Self {
            open: 11,
            extend: 1,
            unaligned: MAX_COST,
            frameshift: 15,
        }
    }
}

impl GapCosts {
    pub fn new(open: i32, extend: i32) -> Self {
        Self {
            open,
            extend,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let bounded = |v: i32| (0..=MAX_COST).contains(&v);
        if !bounded(self.open) || !bounded(self.unaligned) || !bounded(self.frameshift) {
            return Err(SearchError::gap_costs(format!(
                "costs must lie in 0..={} (open {}, unaligned {}, frameshift {})",
                MAX_COST, self.open, self.unaligned, self.frameshift
            )));
        }
        if self.extend < 1 || self.extend > MAX_COST {
            return Err(SearchError::gap_costs(format!(
                "gap extension {} must be positive",
                self.extend
            )));
        }
        if self.unaligned < 1 {
            return Err(SearchError::gap_costs("unaligned cost must be positive"));
        }
        Ok(())
    }

    /// Standard affine gaps: unaligned pairs never beat two gaps.
    #[inline]
    pub fn is_affine(&self) -> bool {
        self.unaligned as i64 >= self.open as i64 + 2 * self.extend as i64
    }
}

/// Where an extension may end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionMode {
    /// Best cell anywhere.
    #[default]
    Local,
    /// Best cell on the last row or column.
    Overlap,
}

impl FromStr for ExtensionMode {
    type Err = SearchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ExtensionMode::Local),
            "overlap" | "global" => Ok(ExtensionMode::Overlap),
            other => Err(SearchError::invalid_config(format!(
                "unknown extension mode {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ExtensionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionMode::Local => f.write_str("local"),
            ExtensionMode::Overlap => f.write_str("overlap"),
        }
    }
}

/// End cell of an extension. `end2` counts seq2 units (nucleotides in 3-frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XdropEnd {
    pub score: i32,
    pub end1: usize,
    pub end2: usize,
}

/// Gap-free run of aligned pairs ending at (end1, end2), exclusive.
/// Covers seq1 `end1-len..end1` and seq2 units `end2-w*len..end2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub end1: usize,
    pub end2: usize,
    pub len: usize,
    /// Frameshift taken before the chunk's first pair: +1 skipped a
    /// nucleotide, -1 reused one, 0 none.
    pub shift: i8,
}

impl Chunk {
    pub fn start1(&self) -> usize {
        self.end1 - self.len
    }

    pub fn start2(&self, width: usize) -> usize {
        self.end2 - width * self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    Free,
    GapY,
    GapZ,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    i: usize,
    j: usize,
    state: TraceState,
}

/// Reusable X-drop aligner; keeps its arena and sequence copies between calls.
#[derive(Debug, Clone, Default)]
pub struct GappedXdropAligner {
    arena: Arena,
    seq1: Vec<u8>,
    units2: Vec<u8>,
    n2: usize,
    costs: GapCosts,
    cursor: Option<Cursor>,
    cells: u64,
}

impl GappedXdropAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Protein vs protein extension.
    pub fn align<M: ScoreMatrix + ?Sized>(
        &mut self,
        seq1: &[u8],
        seq2: &[u8],
        matrix: &M,
        costs: &GapCosts,
        xdrop: i32,
        mode: ExtensionMode,
    ) -> Option<XdropEnd> {
        self.load(seq1, seq2, seq2.len(), costs);
        self.run(1, matrix, xdrop, mode)
    }

    /// Protein vs DNA extension. `units2[p]` is the amino acid of the codon
    /// starting `p` nucleotides from the origin; `len2` is the number of
    /// nucleotides available, so `units2.len() == len2 - 2` when `len2 >= 3`.
    #[allow(clippy::too_many_arguments)]
    pub fn align3<M: ScoreMatrix + ?Sized>(
        &mut self,
        seq1: &[u8],
        units2: &[u8],
        len2: usize,
        matrix: &M,
        costs: &GapCosts,
        xdrop: i32,
        mode: ExtensionMode,
    ) -> Option<XdropEnd> {
        let len2 = len2.min(units2.len() + 2);
        self.load(seq1, units2, len2, costs);
        self.run(3, matrix, xdrop, mode)
    }

    /// Cells computed since construction.
    pub fn cells_computed(&self) -> u64 {
        self.cells
    }

    pub fn width(&self) -> usize {
        self.arena.width()
    }

    fn load(&mut self, seq1: &[u8], units2: &[u8], n2: usize, costs: &GapCosts) {
        self.seq1.clear();
        self.seq1.extend_from_slice(seq1);
        self.units2.clear();
        self.units2.extend_from_slice(units2);
        self.n2 = n2;
        self.costs = *costs;
        self.cursor = None;
    }

    fn run<M: ScoreMatrix + ?Sized>(
        &mut self,
        width: usize,
        matrix: &M,
        xdrop: i32,
        mode: ExtensionMode,
    ) -> Option<XdropEnd> {
        let n1 = self.seq1.len();
        let n2 = self.n2;
        let costs = self.costs;
        let affine = costs.is_affine();
        let gap_first = costs.open.saturating_add(costs.extend);
        let xdrop = xdrop.clamp(0, MAX_COST);

        self.arena.reset(width);
        let k0 = self.arena.push(0, 1);
        self.arena.x[0] = 0;
        self.arena.set_live(k0, Some((0, 0)));

        let mut best = 0i32;
        let mut best_at = (0usize, 0usize);
        let mut edge: Option<(i32, usize, usize)> = None;
        if n1 == 0 || n2 == 0 {
            edge = Some((0, 0, 0));
        }

        let last = width * n1 + n2;
        let mut k = 1;
        while k <= last {
            // union of predecessor live ranges
            let mut lo = usize::MAX;
            let mut hi = 0usize;
            let mut widen = |back: usize, shift: usize| {
                if let Some(kk) = k.checked_sub(back) {
                    if let Some((a, b)) = self.arena.live(kk) {
                        lo = lo.min(a + shift);
                        hi = hi.max(b + shift);
                    }
                }
            };
            widen(2 * width, 1);
            widen(width, 1);
            widen(width, 0);
            if width == 3 {
                widen(2 * width + 1, 1);
                widen(2 * width - 1, 1);
            }
            let geo_lo = k.saturating_sub(n2).div_ceil(width);
            let geo_hi = (k / width).min(n1);
            let lo = lo.max(geo_lo);
            let hi = hi.min(geo_hi);

            let (beg, end) = if lo <= hi { (lo, hi + 1) } else { (lo.min(geo_hi + 1), lo.min(geo_hi + 1)) };
            let kk = self.arena.push(beg, end);
            debug_assert_eq!(kk, k);

            let floor = best.saturating_sub(xdrop);
            let mut live: Option<(usize, usize)> = None;
            let mut diag_best = NEG_INF;
            let mut diag_best_i = 0usize;
            for i in beg..end {
                let j = k - width * i;
                let a = &self.arena;
                let mut x = NEG_INF;
                if i >= 1 && j >= width {
                    let s = matrix.score(self.seq1[i - 1], self.units2[j - width]);
                    x = a.best(a.diag(k, i)).saturating_add(s);
                    if width == 3 {
                        let fs = costs.frameshift;
                        let f = a.best(a.frame_forward(k, i)).saturating_sub(fs).saturating_add(s);
                        let r = a.best(a.frame_reverse(k, i)).saturating_sub(fs).saturating_add(s);
                        x = x.max(f).max(r);
                    }
                }
                let mut y = NEG_INF;
                if i >= 1 {
                    let h = a.hori(k, i);
                    y = a.best(h).saturating_sub(gap_first).max(a.y_at(h).saturating_sub(costs.extend));
                    if !affine {
                        y = y.max(a.y_at(a.diag(k, i)).saturating_sub(costs.unaligned));
                    }
                }
                let mut z = NEG_INF;
                if j >= width {
                    let v = a.vert(k, i);
                    z = a.best(v).saturating_sub(gap_first).max(a.z_at(v).saturating_sub(costs.extend));
                    if !affine {
                        z = z.max(a.z_at(a.diag(k, i)).saturating_sub(costs.unaligned));
                    }
                }
                let (x, y, z) = (x.max(NEG_INF), y.max(NEG_INF), z.max(NEG_INF));
                let b = x.max(y).max(z);
                let slot = self.arena.cell(k, i).unwrap_or_default();
                if b <= NEG_INF || b < floor {
                    continue;
                }
                self.arena.x[slot] = x;
                self.arena.y[slot] = y;
                self.arena.z[slot] = z;
                live = Some(match live {
                    None => (i, i),
                    Some((l, _)) => (l, i),
                });
                if b > diag_best {
                    diag_best = b;
                    diag_best_i = i;
                }
                if (i == n1 || j == n2) && edge.map_or(true, |(e, _, _)| b > e) {
                    edge = Some((b, i, j));
                }
            }
            self.cells += (end - beg) as u64;
            self.arena.set_live(k, live);

            if live.is_some() && diag_best > best {
                best = diag_best;
                best_at = (diag_best_i, k - width * diag_best_i);
            }
            let window = k.saturating_sub(2 * width);
            if (window..=k).all(|kk| self.arena.live(kk).is_none()) {
                break;
            }
            k += 1;
        }

        let (score, end1, end2) = match mode {
            ExtensionMode::Local => (best, best_at.0, best_at.1),
            ExtensionMode::Overlap => edge?,
        };
        self.cursor = Some(Cursor {
            i: end1,
            j: end2,
            state: TraceState::Free,
        });
        Some(XdropEnd { score, end1, end2 })
    }

    #[inline]
    fn slot(&self, i: usize, j: usize) -> Option<usize> {
        self.arena.cell(self.arena.width() * i + j, i)
    }

    /// Next gap-free run of the last extension's traceback, far to near.
    /// Returns None once the origin is reached.
    pub fn next_chunk<M: ScoreMatrix + ?Sized>(&mut self, matrix: &M) -> Option<Chunk> {
        let mut cur = self.cursor?;
        let w = self.arena.width();
        let costs = self.costs;
        let gap_first = costs.open.saturating_add(costs.extend);
        let a = &self.arena;

        // walk gaps until a cell whose best score is an aligned pair
        loop {
            if cur.i == 0 && cur.j == 0 {
                self.cursor = None;
                return None;
            }
            let k = w * cur.i + cur.j;
            let c = self.slot(cur.i, cur.j);
            match cur.state {
                TraceState::Free => {
                    let b = a.best(c);
                    if a.x_at(c) == b {
                        break;
                    } else if a.y_at(c) == b {
                        cur.state = TraceState::GapY;
                    } else {
                        cur.state = TraceState::GapZ;
                    }
                }
                TraceState::GapY => {
                    let y = a.y_at(c);
                    let h = a.hori(k, cur.i);
                    if a.best(h).saturating_sub(gap_first) == y {
                        cur = Cursor { i: cur.i - 1, j: cur.j, state: TraceState::Free };
                    } else if a.y_at(h).saturating_sub(costs.extend) == y {
                        cur.i -= 1;
                    } else if !costs.is_affine()
                        && a.y_at(a.diag(k, cur.i)).saturating_sub(costs.unaligned) == y
                    {
                        cur.i -= 1;
                        cur.j -= w;
                    } else {
                        self.cursor = None;
                        return None;
                    }
                }
                TraceState::GapZ => {
                    let z = a.z_at(c);
                    let v = a.vert(k, cur.i);
                    if a.best(v).saturating_sub(gap_first) == z {
                        cur = Cursor { i: cur.i, j: cur.j - w, state: TraceState::Free };
                    } else if a.z_at(v).saturating_sub(costs.extend) == z {
                        cur.j -= w;
                    } else if !costs.is_affine()
                        && a.z_at(a.diag(k, cur.i)).saturating_sub(costs.unaligned) == z
                    {
                        cur.i -= 1;
                        cur.j -= w;
                    } else {
                        self.cursor = None;
                        return None;
                    }
                }
            }
        }

        let (end1, end2) = (cur.i, cur.j);
        let mut len = 0usize;
        let mut shift = 0i8;
        loop {
            if cur.i == 0 || cur.j < w {
                break;
            }
            let k = w * cur.i + cur.j;
            let c = self.slot(cur.i, cur.j);
            let x = a.x_at(c);
            if x != a.best(c) {
                break;
            }
            let s = matrix.score(self.seq1[cur.i - 1], self.units2[cur.j - w]);
            if a.best(a.diag(k, cur.i)).saturating_add(s) == x {
                cur.i -= 1;
                cur.j -= w;
                len += 1;
                continue;
            }
            if w == 3 {
                let base = x.saturating_add(costs.frameshift).saturating_sub(s);
                if a.best(a.frame_forward(k, cur.i)) == base {
                    cur.i -= 1;
                    cur.j -= w + 1;
                    len += 1;
                    shift = 1;
                    break;
                }
                if a.best(a.frame_reverse(k, cur.i)) == base {
                    cur.i -= 1;
                    cur.j -= w - 1;
                    len += 1;
                    shift = -1;
                    break;
                }
            }
            break;
        }
        cur.state = TraceState::Free;
        self.cursor = Some(cur);
        if len == 0 {
            self.cursor = None;
            return None;
        }
        Some(Chunk { end1, end2, len, shift })
    }

    /// All remaining chunks, far to near.
    pub fn chunks<M: ScoreMatrix + ?Sized>(&mut self, matrix: &M) -> Vec<Chunk> {
        let mut out = Vec::new();
        while let Some(c) = self.next_chunk(matrix) {
            out.push(c);
        }
        out
    }
}
