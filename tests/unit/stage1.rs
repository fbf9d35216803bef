//! Fingerprint backend tests

use proptest::prelude::*;
use seedjoin::stage1::fingerprint::{Backend, FingerPrint, FINGERPRINT_LEN, QUERY_PAD, REFERENCE_PAD};
use seedjoin::stage1::stage1_search;

fn window() -> impl Strategy<Value = Vec<u8>> {
    // small alphabet so that windows share many letters
    prop::collection::vec(0u8..5, 0..=FINGERPRINT_LEN)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_every_backend_matches_scalar(a in window(), b in window()) {
        let fa = FingerPrint::from_bytes(&a, QUERY_PAD);
        let fb = FingerPrint::from_bytes(&b, REFERENCE_PAD);
        let expected = Backend::Scalar.match_count(&fa, &fb);
        let by_hand = a.iter().zip(&b).filter(|(x, y)| x == y).count() as u32;
        prop_assert_eq!(expected, by_hand);
        for backend in Backend::available() {
            prop_assert_eq!(backend.match_count(&fa, &fb), expected, "backend {}", backend);
        }
    }

    #[test]
    fn test_tiled_search_reports_exactly_passing_pairs(
        qs in prop::collection::vec(window(), 0..20),
        ss in prop::collection::vec(window(), 0..20),
        threshold in 0u32..12,
    ) {
        let q: Vec<FingerPrint> = qs.iter().map(|w| FingerPrint::from_bytes(w, QUERY_PAD)).collect();
        let s: Vec<FingerPrint> = ss.iter().map(|w| FingerPrint::from_bytes(w, REFERENCE_PAD)).collect();
        let mut expected = Vec::new();
        for (i, a) in q.iter().enumerate() {
            for (j, b) in s.iter().enumerate() {
                if Backend::Scalar.match_count(a, b) >= threshold {
                    expected.push((i, j));
                }
            }
        }
        for backend in Backend::available() {
            let mut got = Vec::new();
            let compared = stage1_search(&q, &s, backend, threshold, |i, j| got.push((i, j)));
            got.sort_unstable();
            prop_assert_eq!(compared as usize, q.len() * s.len());
            prop_assert_eq!(&got, &expected);
        }
    }
}
