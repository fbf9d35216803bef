//! Gapped X-drop extension tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use seedjoin::align::xdrop::MAX_COST;
use seedjoin::align::{ExtensionMode, GapCosts, GappedXdropAligner};
use seedjoin::utils::matrix::{encode_protein, Blosum62};
use seedjoin::utils::translate::translate_by_offset;

use crate::helpers::{coding, dna, full_dp_score, full_dp_units, mutated, protein, rescore_chunks};

fn pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    prop_oneof![
        (protein(30), protein(30)),
        protein(40).prop_flat_map(mutated),
    ]
}

/// Protein against DNA: either unrelated or a frameshifted copy of its coding strand.
fn translated_pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    prop_oneof![
        (protein(16), dna(48)),
        coding(60),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_unbounded_xdrop_equals_full_dp((a, b) in pair()) {
        let m = Blosum62::new();
        let costs = GapCosts::default();
        let mut x = GappedXdropAligner::new();
        let end = x.align(&a, &b, &m, &costs, MAX_COST, ExtensionMode::Local).unwrap();
        prop_assert_eq!(end.score, full_dp_score(&a, &b, &m, &costs));
    }

    #[test]
    fn test_traceback_rescores_to_reported_score((a, b) in pair(), xdrop in prop::sample::select(vec![5, 20, 60])) {
        let m = Blosum62::new();
        let costs = GapCosts::default();
        let mut x = GappedXdropAligner::new();
        let end = x.align(&a, &b, &m, &costs, xdrop, ExtensionMode::Local).unwrap();
        let chunks = x.chunks(&m);
        prop_assert!(chunks.iter().all(|c| c.len > 0 && c.shift == 0));
        prop_assert_eq!(rescore_chunks(&a, &b, 1, &chunks, (end.end1, end.end2), &m, &costs), end.score);
    }

    #[test]
    fn test_translated_traceback_rescores_to_reported_score(
        (a, nt) in translated_pair(),
        xdrop in prop::sample::select(vec![5, 20, 60, MAX_COST]),
        frameshift in prop::sample::select(vec![5, 15]),
    ) {
        let m = Blosum62::new();
        let costs = GapCosts { frameshift, ..GapCosts::default() };
        let units = translate_by_offset(&nt);
        let mut x = GappedXdropAligner::new();
        let end = x.align3(&a, &units, nt.len(), &m, &costs, xdrop, ExtensionMode::Local).unwrap();
        if xdrop == MAX_COST {
            prop_assert_eq!(end.score, full_dp_units(&a, &units, nt.len(), 3, &m, &costs));
        }
        let chunks = x.chunks(&m);
        prop_assert!(chunks.iter().all(|c| c.len > 0 && (-1..=1).contains(&c.shift)));
        prop_assert_eq!(rescore_chunks(&a, &units, 3, &chunks, (end.end1, end.end2), &m, &costs), end.score);
    }

    #[test]
    fn test_unaligned_pairs_match_full_dp((a, b) in pair(), unaligned in 1i32..13) {
        let m = Blosum62::new();
        let costs = GapCosts { unaligned, ..GapCosts::default() };
        prop_assert!(!costs.is_affine());
        prop_assert!(costs.validate().is_ok());
        let mut x = GappedXdropAligner::new();
        let end = x.align(&a, &b, &m, &costs, MAX_COST, ExtensionMode::Local).unwrap();
        prop_assert_eq!(end.score, full_dp_units(&a, &b, b.len(), 1, &m, &costs));
        // cheap unaligned pairs can only help
        prop_assert!(end.score >= full_dp_score(&a, &b, &m, &GapCosts::default()));
    }

    #[test]
    fn test_score_grows_with_xdrop((a, b) in pair(), drops in prop::collection::vec(0i32..60, 2..6)) {
        let m = Blosum62::new();
        let costs = GapCosts::default();
        let mut drops = drops;
        drops.sort_unstable();
        drops.push(MAX_COST);
        let mut x = GappedXdropAligner::new();
        let scores: Vec<i32> = drops
            .iter()
            .map(|&xd| x.align(&a, &b, &m, &costs, xd, ExtensionMode::Local).unwrap().score)
            .collect();
        prop_assert!(scores.windows(2).all(|s| s[0] <= s[1]), "{:?} -> {:?}", drops, scores);
        prop_assert_eq!(*scores.last().unwrap(), full_dp_score(&a, &b, &m, &costs));
    }

    #[test]
    fn test_bounded_xdrop_never_beats_full_dp((a, b) in pair(), xdrop in 0i32..40) {
        let m = Blosum62::new();
        let costs = GapCosts::default();
        let mut x = GappedXdropAligner::new();
        let end = x.align(&a, &b, &m, &costs, xdrop, ExtensionMode::Local).unwrap();
        prop_assert!(end.score >= 0);
        prop_assert!(end.score <= full_dp_score(&a, &b, &m, &costs));
    }
}

#[test]
fn test_larger_xdrop_crosses_mismatch_run() {
    let m = Blosum62::new();
    let a = encode_protein(b"WWWWCCCCWWWWWW");
    let b = encode_protein(b"WWWWEEEEWWWWWW");
    let mut x = GappedXdropAligner::new();
    let scores: Vec<i32> = [0, 10, 20, 100]
        .iter()
        .map(|&xd| x.align(&a, &b, &m, &GapCosts::default(), xd, ExtensionMode::Local).unwrap().score)
        .collect();
    assert_eq!(scores, vec![44, 44, 94, 94]);
}

#[test]
fn test_reused_aligner_counts_cells_cumulatively() {
    let m = Blosum62::new();
    let a = encode_protein(b"MKVLAAGIWWHEE");
    let mut x = GappedXdropAligner::new();
    x.align(&a, &a, &m, &GapCosts::default(), 20, ExtensionMode::Local).unwrap();
    let first = x.cells_computed();
    assert!(first > 0);
    x.align(&a, &a, &m, &GapCosts::default(), 20, ExtensionMode::Local).unwrap();
    assert_eq!(x.cells_computed(), 2 * first);
}
