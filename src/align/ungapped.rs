//! Ungapped X-drop score of a window around a seed hit
//!
//! Used as a cheap second stage between the fingerprint filter and gapped
//! extension: the hit diagonal is extended without gaps at most `window`
//! residues to each side of the seed start. Extension never crosses a
//! delimiter, so positions may index a concatenated sequence buffer.

use crate::utils::matrix::{ScoreMatrix, DELIMITER};

/// Best ungapped extension around (q_pos, s_pos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UngappedScore {
    pub score: i32,
    /// Residues taken left of the seed start.
    pub left: usize,
    /// Residues taken from the seed start rightwards.
    pub right: usize,
}

#[inline]
fn extend_left<M: ScoreMatrix + ?Sized>(
    q: &[u8],
    s: &[u8],
    q_pos: usize,
    s_pos: usize,
    limit: usize,
    x_drop: i32,
    matrix: &M,
) -> (i32, usize) {
    let max_left = q_pos.min(s_pos).min(limit);
    let mut score = 0;
    let mut best = 0;
    let mut disp = 0;
    for i in 0..max_left {
        let (a, b) = (q[q_pos - 1 - i], s[s_pos - 1 - i]);
        if a == DELIMITER || b == DELIMITER {
            break;
        }
        score += matrix.score(a, b);
        if score > best {
            best = score;
            disp = i + 1;
        }
        if best - score >= x_drop {
            break;
        }
    }
    (best, disp)
}

#[inline]
fn extend_right<M: ScoreMatrix + ?Sized>(
    q: &[u8],
    s: &[u8],
    q_pos: usize,
    s_pos: usize,
    limit: usize,
    x_drop: i32,
    matrix: &M,
) -> (i32, usize) {
    let max_right = (q.len() - q_pos).min(s.len() - s_pos).min(limit);
    let mut score = 0;
    let mut best = 0;
    let mut disp = 0;
    for j in 0..max_right {
        let (a, b) = (q[q_pos + j], s[s_pos + j]);
        if a == DELIMITER || b == DELIMITER {
            break;
        }
        score += matrix.score(a, b);
        if score > best {
            best = score;
            disp = j + 1;
        }
        if best - score >= x_drop {
            break;
        }
    }
    (best, disp)
}

/// Score of the best ungapped segment through the seed start that stays
/// within `window` residues on either side.
pub fn ungapped_window_score<M: ScoreMatrix + ?Sized>(
    q: &[u8],
    q_pos: usize,
    s: &[u8],
    s_pos: usize,
    window: usize,
    x_drop: i32,
    matrix: &M,
) -> UngappedScore {
    if q_pos > q.len() || s_pos > s.len() {
        return UngappedScore::default();
    }
    let (left_score, left) = extend_left(q, s, q_pos, s_pos, window, x_drop, matrix);
    let (right_score, right) = extend_right(q, s, q_pos, s_pos, window, x_drop, matrix);
    UngappedScore {
        score: left_score + right_score,
        left,
        right,
    }
}
