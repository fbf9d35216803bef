//! Hash join and radix clustering tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use seedjoin::core::PackedPosition;
use seedjoin::error::SearchError;
use seedjoin::join::hash_join::{hash_table_join, table_join};
use seedjoin::join::radix::{cluster_start, radix_cluster, radix_cluster_parallel};
use seedjoin::join::{hash_join, DoubleArray, JoinConfig, Relation, SeedEntry};

use crate::helpers::{entry, index_of, naive_join, regroup};

fn relation_strategy(key_bits: u32, max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..(1u64 << key_bits), 0..max_len)
}

fn entries(keys: &[u64], first_index: usize) -> Vec<SeedEntry<PackedPosition>> {
    keys.iter().enumerate().map(|(i, &k)| entry(k, first_index + i)).collect()
}

/// Forces radix clustering for anything but tiny inputs.
fn splitting_config(threads: usize) -> JoinConfig {
    JoinConfig {
        split_size: 8,
        split_key_len: 1,
        radix_bits: 2,
        ht_factor: 1.3,
        swap: true,
        threads,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn test_hash_join_equals_naive_join(
        key_bits in 1u32..10,
        seed in any::<u64>(),
        r_len in 0usize..300,
        s_len in 0usize..300,
    ) {
        let mask = (1u64 << key_bits) - 1;
        let mut x = seed | 1;
        let mut next = || {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x & mask
        };
        let r_keys: Vec<u64> = (0..r_len).map(|_| next()).collect();
        let s_keys: Vec<u64> = (0..s_len).map(|_| next()).collect();
        let r = entries(&r_keys, 0);
        let s = entries(&s_keys, r_len);
        let expected = naive_join(&r, &s);

        for cfg in [JoinConfig::default(), splitting_config(1), splitting_config(4)] {
            let (out_r, out_s) = hash_join(
                Relation::new(&r, key_bits),
                Relation::new(&s, key_bits),
                &cfg,
            ).unwrap();
            prop_assert_eq!(regroup(&out_r, &out_s), expected.clone());
            prop_assert_eq!(out_r.total(), expected.values().map(|g| g.0.len()).sum::<usize>());
        }
    }

    #[test]
    fn test_swap_never_exchanges_sides(r_keys in relation_strategy(4, 40), s_keys in relation_strategy(4, 10)) {
        let r = entries(&r_keys, 0);
        let s = entries(&s_keys, 1000);
        let cfg = JoinConfig { swap: true, ..JoinConfig::default() };
        let (out_r, _) = hash_join(Relation::new(&r, 4), Relation::new(&s, 4), &cfg).unwrap();
        for (_, group) in out_r.iter() {
            prop_assert!(group.iter().all(|l| (l.get() & 0xFFFF) < 1000));
        }
    }

    #[test]
    fn test_direct_table_matches_hash_table(r_keys in relation_strategy(6, 80), s_keys in relation_strategy(6, 80)) {
        let r = entries(&r_keys, 0);
        let s = entries(&s_keys, 100);
        let (mut hr, mut hs) = (DoubleArray::new(), DoubleArray::new());
        hash_table_join(&r, &s, 0, 1.3, &mut hr, &mut hs);
        let (mut tr, mut ts) = (DoubleArray::new(), DoubleArray::new());
        table_join(&r, &s, 6, 0, &mut tr, &mut ts);
        prop_assert_eq!(regroup(&hr, &hs), regroup(&tr, &ts));
        prop_assert_eq!(regroup(&hr, &hs), naive_join(&r, &s));
    }

    #[test]
    fn test_radix_cluster_is_stable_partition(keys in relation_strategy(12, 400), shift in 0u32..8, bits in 1u32..5) {
        let src = entries(&keys, 0);
        let mut dst = vec![SeedEntry::default(); src.len()];
        let ends = radix_cluster(&src, shift, bits, &mut dst);
        prop_assert_eq!(ends.len(), 1 << bits);
        prop_assert_eq!(*ends.last().unwrap(), src.len());
        for c in 0..ends.len() {
            let cluster = &dst[cluster_start(&ends, c)..ends[c]];
            prop_assert!(cluster.iter().all(|e| ((e.key >> shift) & ((1 << bits) - 1)) as usize == c));
            // input order survives inside a cluster
            prop_assert!(cluster.windows(2).all(|w| index_of(w[0].loc) < index_of(w[1].loc)));
        }

        // clustering the output again on the same bits changes nothing
        let mut again = vec![SeedEntry::default(); dst.len()];
        let ends_again = radix_cluster(&dst, shift, bits, &mut again);
        prop_assert_eq!(&ends_again, &ends);
        prop_assert_eq!(&again, &dst);
    }

    #[test]
    fn test_parallel_cluster_matches_serial(keys in relation_strategy(10, 2000), parts in 1usize..9) {
        let src = entries(&keys, 0);
        let mut serial = vec![SeedEntry::default(); src.len()];
        let mut parallel = vec![SeedEntry::default(); src.len()];
        let a = radix_cluster(&src, 2, 3, &mut serial);
        let b = radix_cluster_parallel(&src, 2, 3, &mut parallel, parts);
        prop_assert_eq!(a, b);
        prop_assert_eq!(serial, parallel);
    }
}

#[test]
fn test_radix_cluster_keeps_input_order_of_descending_keys() {
    // both keys are odd, so they share cluster 1 in input order
    let src = entries(&[2627, 2227], 0);
    let mut dst = vec![SeedEntry::default(); src.len()];
    let ends = radix_cluster(&src, 0, 1, &mut dst);
    assert_eq!(ends, vec![0, 2]);
    let order: Vec<(u64, u64)> = dst.iter().map(|e| (e.key, index_of(e.loc))).collect();
    assert_eq!(order, vec![(2627, 0), (2227, 1)]);
}

#[test]
fn test_key_width_mismatch_is_rejected() {
    let r = entries(&[1, 2, 3], 0);
    let err = hash_join(Relation::new(&r, 20), Relation::new(&r, 21), &JoinConfig::default()).unwrap_err();
    assert!(matches!(err, SearchError::KeyWidthMismatch { left: 20, right: 21 }));
}

#[test]
fn test_empty_side_yields_no_groups() {
    let r = entries(&[1, 2, 3], 0);
    let (out_r, out_s) = hash_join(Relation::new(&r, 4), Relation::new(&[], 4), &JoinConfig::default()).unwrap();
    assert_eq!(out_r.group_count(), 0);
    assert_eq!(out_s.group_count(), 0);
}

#[test]
fn test_zero_key_bits_join_everything() {
    let r = entries(&[0, 0], 0);
    let s = entries(&[0, 0, 0], 10);
    let (out_r, out_s) = hash_join(Relation::new(&r, 0), Relation::new(&s, 0), &splitting_config(2)).unwrap();
    assert_eq!(out_r.group_count(), 1);
    assert_eq!(out_r.total(), 2);
    assert_eq!(out_s.total(), 3);
}
