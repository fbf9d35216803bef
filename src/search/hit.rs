//! Scored seed hits
//!
//! One `Hit` per extended primary seed pair. Ordering across partitions is
//! unspecified; consumers sort with one of the comparators below.

use std::cmp::Ordering;

use crate::align::result::AlignmentResult;
use crate::core::packed::PackedPosition;

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Query record.
    pub query_id: u32,
    /// Reference position of the seed start.
    pub subject: PackedPosition,
    /// Query offset of the seed start.
    pub seed_offset: u32,
    /// Gapped extension score.
    pub score: i32,
    /// Reference record owning `subject`.
    pub target_block_id: u32,
    /// Extension in record-local coordinates.
    pub alignment: AlignmentResult,
}

impl Hit {
    /// Diagonal in concatenated reference coordinates.
    #[inline]
    pub fn global_diagonal(&self) -> i64 {
        self.subject.get() as i64 - self.seed_offset as i64
    }
}

/// Subject position, then query, then seed offset.
pub fn by_subject(a: &Hit, b: &Hit) -> Ordering {
    a.subject
        .cmp(&b.subject)
        .then(a.query_id.cmp(&b.query_id))
        .then(a.seed_offset.cmp(&b.seed_offset))
}

/// Query, then subject position.
pub fn by_query_subject(a: &Hit, b: &Hit) -> Ordering {
    a.query_id
        .cmp(&b.query_id)
        .then(a.subject.cmp(&b.subject))
}

/// Query only; stable sorts keep the relative order of each query's hits.
pub fn by_query(a: &Hit, b: &Hit) -> Ordering {
    a.query_id.cmp(&b.query_id)
}

/// Global diagonal, then seed offset.
pub fn by_diagonal(a: &Hit, b: &Hit) -> Ordering {
    let x = a.subject.get() + b.seed_offset as u64;
    let y = b.subject.get() + a.seed_offset as u64;
    x.cmp(&y).then(a.seed_offset.cmp(&b.seed_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query_id: u32, subject: u64, seed_offset: u32) -> Hit {
        Hit {
            query_id,
            subject: PackedPosition::new(subject).unwrap(),
            seed_offset,
            score: 0,
            target_block_id: 0,
            alignment: AlignmentResult::from_segments(0, Vec::new(), 1, false, |_, _| (0, 0)),
        }
    }

    #[test]
    fn test_by_subject_breaks_ties_on_query_then_offset() {
        let mut hits = vec![hit(2, 10, 0), hit(1, 10, 5), hit(1, 10, 3), hit(0, 20, 0)];
        hits.sort_by(by_subject);
        let keys: Vec<_> = hits.iter().map(|h| (h.subject.get(), h.query_id, h.seed_offset)).collect();
        assert_eq!(keys, vec![(10, 1, 3), (10, 1, 5), (10, 2, 0), (20, 0, 0)]);
    }

    #[test]
    fn test_by_query_is_stable() {
        let mut hits = vec![hit(1, 30, 0), hit(0, 20, 0), hit(1, 10, 0)];
        hits.sort_by(by_query);
        let subjects: Vec<_> = hits.iter().map(|h| h.subject.get()).collect();
        assert_eq!(subjects, vec![20, 30, 10]);
        hits.sort_by(by_query_subject);
        let subjects: Vec<_> = hits.iter().map(|h| h.subject.get()).collect();
        assert_eq!(subjects, vec![20, 10, 30]);
    }

    #[test]
    fn test_diagonal_order() {
        let a = hit(0, 12, 2);
        let b = hit(0, 15, 4);
        assert_eq!(a.global_diagonal(), 10);
        assert_eq!(b.global_diagonal(), 11);
        assert_eq!(by_diagonal(&a, &b), Ordering::Less);
        assert_eq!(by_diagonal(&b, &a), Ordering::Greater);
    }
}
