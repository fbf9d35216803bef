//! Antidiagonal score arena
//!
//! Cell (i, j) of the edit graph lives on antidiagonal `k = w*i + j`, where
//! `w` is the number of seq2 units one seq1 residue consumes (1 for protein
//! vs protein, 3 for protein vs DNA). Each antidiagonal stores a contiguous
//! range of i values; the three score vectors hold one slot per stored cell.
//! All predecessor lookups go through the helpers below.

use super::NEG_INF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Antidiagonal {
    /// First stored i.
    pub beg: usize,
    /// One past the last stored i.
    pub end: usize,
    /// Slot of `beg` in the score vectors.
    pub offset: usize,
    /// Smallest and largest i left alive after X-drop pruning.
    pub live: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct Arena {
    width: usize,
    diags: Vec<Antidiagonal>,
    pub(crate) x: Vec<i32>,
    pub(crate) y: Vec<i32>,
    pub(crate) z: Vec<i32>,
}

impl Arena {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn reset(&mut self, width: usize) {
        self.width = width;
        self.diags.clear();
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of antidiagonals stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Total cells stored.
    pub fn cells(&self) -> usize {
        self.x.len()
    }

    pub fn antidiagonal(&self, k: usize) -> Option<&Antidiagonal> {
        self.diags.get(k)
    }

    /// Append antidiagonal `len()` covering i in `beg..end`, all cells dead.
    pub fn push(&mut self, beg: usize, end: usize) -> usize {
        let end = end.max(beg);
        let offset = self.x.len();
        let n = end - beg;
        self.x.resize(offset + n, NEG_INF);
        self.y.resize(offset + n, NEG_INF);
        self.z.resize(offset + n, NEG_INF);
        self.diags.push(Antidiagonal {
            beg,
            end,
            offset,
            live: None,
        });
        self.diags.len() - 1
    }

    pub fn set_live(&mut self, k: usize, live: Option<(usize, usize)>) {
        if let Some(d) = self.diags.get_mut(k) {
            d.live = live;
        }
    }

    #[inline]
    pub fn live(&self, k: usize) -> Option<(usize, usize)> {
        self.diags.get(k).and_then(|d| d.live)
    }

    /// Slot of cell `i` on antidiagonal `k`, if stored.
    #[inline]
    pub fn cell(&self, k: usize, i: usize) -> Option<usize> {
        let d = self.diags.get(k)?;
        if i >= d.beg && i < d.end {
            Some(d.offset + i - d.beg)
        } else {
            None
        }
    }

    /// Predecessor (i-1, j-w): both sequences advance.
    #[inline]
    pub fn diag(&self, k: usize, i: usize) -> Option<usize> {
        self.cell(k.checked_sub(2 * self.width)?, i.checked_sub(1)?)
    }

    /// Predecessor (i-1, j): gap consuming seq1.
    #[inline]
    pub fn hori(&self, k: usize, i: usize) -> Option<usize> {
        self.cell(k.checked_sub(self.width)?, i.checked_sub(1)?)
    }

    /// Predecessor (i, j-w): gap consuming seq2.
    #[inline]
    pub fn vert(&self, k: usize, i: usize) -> Option<usize> {
        self.cell(k.checked_sub(self.width)?, i)
    }

    /// Predecessor (i-1, j-w-1): one extra seq2 unit skipped.
    #[inline]
    pub fn frame_forward(&self, k: usize, i: usize) -> Option<usize> {
        self.cell(k.checked_sub(2 * self.width + 1)?, i.checked_sub(1)?)
    }

    /// Predecessor (i-1, j-w+1): one seq2 unit reused.
    #[inline]
    pub fn frame_reverse(&self, k: usize, i: usize) -> Option<usize> {
        self.cell((k + 1).checked_sub(2 * self.width)?, i.checked_sub(1)?)
    }

    /// max(X, Y, Z) of a slot, NEG_INF if absent.
    #[inline]
    pub fn best(&self, slot: Option<usize>) -> i32 {
        match slot {
            Some(c) => self.x[c].max(self.y[c]).max(self.z[c]),
            None => NEG_INF,
        }
    }

    #[inline]
    pub fn x_at(&self, slot: Option<usize>) -> i32 {
        slot.map_or(NEG_INF, |c| self.x[c])
    }

    #[inline]
    pub fn y_at(&self, slot: Option<usize>) -> i32 {
        slot.map_or(NEG_INF, |c| self.y[c])
    }

    #[inline]
    pub fn z_at(&self, slot: Option<usize>) -> i32 {
        slot.map_or(NEG_INF, |c| self.z[c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store every geometrically valid cell for an n1 x n2 grid.
    fn full(width: usize, n1: usize, n2: usize) -> Arena {
        let mut a = Arena::new(width);
        for k in 0..=width * n1 + n2 {
            let lo = k.saturating_sub(n2).div_ceil(width);
            let hi = (k / width).min(n1);
            a.push(lo, hi + 1);
        }
        a
    }

    fn coords(a: &Arena, slot: usize) -> (usize, usize) {
        for k in 0..a.len() {
            let d = a.antidiagonal(k).unwrap();
            if slot >= d.offset && slot < d.offset + (d.end - d.beg) {
                let i = d.beg + slot - d.offset;
                return (i, k - a.width() * i);
            }
        }
        panic!("slot {} not stored", slot);
    }

    #[test]
    fn test_predecessors_standard() {
        let a = full(1, 4, 5);
        // cell (2, 3) on k = 5
        let k = 5;
        assert_eq!(coords(&a, a.cell(k, 2).unwrap()), (2, 3));
        assert_eq!(coords(&a, a.diag(k, 2).unwrap()), (1, 2));
        assert_eq!(coords(&a, a.hori(k, 2).unwrap()), (1, 3));
        assert_eq!(coords(&a, a.vert(k, 2).unwrap()), (2, 2));
    }

    #[test]
    fn test_predecessors_three_frame() {
        let a = full(3, 4, 12);
        // cell (2, 7) on k = 13
        let k = 13;
        assert_eq!(coords(&a, a.cell(k, 2).unwrap()), (2, 7));
        assert_eq!(coords(&a, a.diag(k, 2).unwrap()), (1, 4));
        assert_eq!(coords(&a, a.hori(k, 2).unwrap()), (1, 7));
        assert_eq!(coords(&a, a.vert(k, 2).unwrap()), (2, 4));
        assert_eq!(coords(&a, a.frame_forward(k, 2).unwrap()), (1, 3));
        assert_eq!(coords(&a, a.frame_reverse(k, 2).unwrap()), (1, 5));
    }

    #[test]
    fn test_edges_have_no_predecessor() {
        let a = full(1, 3, 3);
        assert_eq!(a.diag(0, 0), None);
        assert_eq!(a.hori(1, 0), None);
        assert_eq!(a.vert(1, 1), None);
        // (0, 2): only the vertical predecessor exists
        assert_eq!(a.diag(2, 0), None);
        assert!(a.vert(2, 0).is_some());
        // beyond seq2's end: antidiagonal 4 starts at i = 1
        assert_eq!(a.cell(4, 0), None);
        assert!(a.cell(4, 1).is_some());
    }

    #[test]
    fn test_empty_range_and_best() {
        let mut a = Arena::new(1);
        let k = a.push(0, 1);
        a.x[0] = 5;
        a.y[0] = 7;
        assert_eq!(a.best(a.cell(k, 0)), 7);
        let e = a.push(3, 2);
        assert_eq!(a.cell(e, 2), None);
        assert_eq!(a.best(None), NEG_INF);
        assert_eq!(a.cells(), 1);
    }
}
