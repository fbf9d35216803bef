//! Seed index and neighborhood tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use seedjoin::core::PackedPosition;
use seedjoin::seed::neighborhood::neighborhood;
use seedjoin::seed::{IndexParams, KeyEncoding, NoFilter, PartitionRange, Partitioning, Reduction, SeedIndex, Shape};
use seedjoin::utils::matrix::{encode_protein, Blosum62, ScoreMatrix, STANDARD_AA};
use seedjoin::{SequenceCollection, SequenceSet};

use crate::helpers::protein;

type Parts = Vec<Vec<(u64, u64)>>;

/// Index `set` over 8 partitions; entries per partition as sorted (key, position).
fn build(set: &SequenceSet, shape: &Shape, reduction: &Reduction, budget: u32, threads: usize) -> (KeyEncoding, Partitioning, Parts) {
    let partitioning = Partitioning::new(3).unwrap();
    let encoding = KeyEncoding::select(shape, reduction, budget).unwrap();
    let params = IndexParams {
        shape,
        shape_id: 0,
        reduction,
        encoding,
        partitioning,
        range: PartitionRange::all(&partitioning),
        seed_mask: None,
        threads,
    };
    let index: SeedIndex<PackedPosition> = SeedIndex::build(set, &params, &NoFilter).unwrap();
    let parts = (0..partitioning.count())
        .map(|p| {
            let mut v: Vec<(u64, u64)> = index.partition(p).data().iter().map(|e| (e.key, e.loc.get())).collect();
            v.sort_unstable();
            v
        })
        .collect();
    (encoding, partitioning, parts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_index_entries_land_in_their_key_partition(
        records in prop::collection::vec(protein(60), 1..6),
        budget in prop::sample::select(vec![12u32, 32]),
    ) {
        let mut set = SequenceSet::new();
        for (i, r) in records.iter().enumerate() {
            set.push(format!("r{}", i), r).unwrap();
        }
        let shape = Shape::new("1101011").unwrap();
        let reduction = Reduction::default_protein();
        let (encoding, partitioning, parts) = build(&set, &shape, &reduction, budget, 1);
        prop_assert_eq!(encoding.is_hashed(), budget == 12);

        let expected: usize = records.iter().map(|r| (r.len() + 1).saturating_sub(shape.length())).sum();
        prop_assert_eq!(parts.iter().map(Vec::len).sum::<usize>(), expected);
        for (p, entries) in parts.iter().enumerate() {
            for &(key, pos) in entries {
                let (rec, off) = set.local_position(PackedPosition::new(pos).unwrap());
                let window = &set.sequence(rec)[off..];
                let full = encoding.key(shape.pack(window, &reduction).unwrap());
                prop_assert_eq!(partitioning.partition(full), p);
                prop_assert_eq!(partitioning.offset(full), key);
            }
        }

        let (_, _, threaded) = build(&set, &shape, &reduction, budget, 3);
        prop_assert_eq!(threaded, parts);
    }
}

#[test]
fn test_neighborhood_matches_brute_force() {
    let m = Blosum62::new();
    let seed = encode_protein(b"WC");
    for threshold in [0, 10, 15, 20] {
        let mut expected = Vec::new();
        for &a in &STANDARD_AA {
            for &b in &STANDARD_AA {
                if m.score(seed[0], a) + m.score(seed[1], b) >= threshold {
                    expected.push(vec![a, b]);
                }
            }
        }
        expected.sort();
        let mut got = neighborhood(&seed, &m, threshold);
        got.sort();
        assert_eq!(got, expected, "threshold {}", threshold);
    }
    // W/W + C/C is the best any pair can do
    assert_eq!(neighborhood(&seed, &m, 20), vec![seed.clone()]);
}
