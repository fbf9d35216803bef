//! End-to-end searches

use pretty_assertions::assert_eq;
use seedjoin::search::Stat;
use seedjoin::utils::matrix::Blosum62;
use seedjoin::{run_search, seed_matches, SearchConfig, SequenceCollection, SequenceSet};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> SearchConfig {
    SearchConfig {
        threads: 2,
        ..SearchConfig::default()
    }
}

fn sets(query: &[&str], reference: &[&str]) -> (SequenceSet, SequenceSet) {
    (
        SequenceSet::from_ascii(query).unwrap(),
        SequenceSet::from_ascii(reference).unwrap(),
    )
}

#[test]
fn test_single_exact_hit() {
    init_logging();
    let (q, r) = sets(&["ACDEFGHIKL"], &["XXACDEFGHIKLXX"]);
    let out = run_search(&q, &r, &Blosum62::new(), &config()).unwrap();
    assert_eq!(out.hits.len(), 1);
    let hit = &out.hits[0];
    assert_eq!(hit.score, 57);
    assert_eq!(hit.query_id, 0);
    assert_eq!(hit.target_block_id, 0);
    assert_eq!(hit.seed_offset, 0);
    assert_eq!(hit.subject, r.position(0, 2));
    let a = &hit.alignment;
    assert_eq!((a.q_start, a.q_end, a.s_start, a.s_end), (0, 10, 2, 12));
    assert_eq!(a.matches, 10);
    assert_eq!(a.gap_opens, 0);
    assert_eq!(out.stats.get(Stat::SeedHits), 3);
    assert_eq!(out.stats.get(Stat::CollisionRejected), 2);
    assert_eq!(out.stats.get(Stat::HitsEmitted), 1);
}

#[test]
fn test_block_ids_and_chunking_keep_the_result() {
    let (q, r) = sets(&["MMMM", "ACDEFGHIKL"], &["PPPP", "XXACDEFGHIKLXX"]);
    let baseline = run_search(&q, &r, &Blosum62::new(), &config()).unwrap();
    assert_eq!(baseline.hits.len(), 1);
    assert_eq!(baseline.hits[0].query_id, 1);
    assert_eq!(baseline.hits[0].target_block_id, 1);

    let with_ids = SearchConfig {
        resolve_block_ids: true,
        ..config()
    };
    let out = run_search(&q, &r, &Blosum62::new(), &with_ids).unwrap();
    assert_eq!(out.hits, baseline.hits);

    // with several chunks a different seed of the run may be the one
    // extended, but the run still yields one hit of the same score
    let chunked = SearchConfig {
        index_chunks: 4,
        ..config()
    };
    let out = run_search(&q, &r, &Blosum62::new(), &chunked).unwrap();
    assert_eq!(out.hits.len(), 1);
    assert_eq!(out.hits[0].score, 57);
    assert_eq!(out.hits[0].alignment.q_start, 0);
    assert_eq!(out.hits[0].alignment.q_end, 10);
}

#[test]
fn test_frequency_cap_boundary() {
    // ACDEFGHI joins 1 x 2 locations, the other two seeds 1 x 1;
    // with freq_sd = 0 the cap is floor(4/3) = 1
    let (q, r) = sets(&["ACDEFGHIKL"], &["ACDEFGHIKL", "WWACDEFGHIWW"]);
    let cfg = SearchConfig {
        freq_sd: 0.0,
        min_identities: 8,
        ..config()
    };
    let out = run_search(&q, &r, &Blosum62::new(), &cfg).unwrap();
    assert_eq!(out.stats.get(Stat::FrequencyMaskedGroups), 1);
    assert_eq!(out.stats.get(Stat::FrequencyMaskedPositions), 1);
    // the masked seed no longer shadows its right neighbour
    assert_eq!(out.hits.len(), 1);
    assert_eq!(out.hits[0].seed_offset, 1);
    assert_eq!(out.hits[0].target_block_id, 0);
    assert_eq!(out.hits[0].score, 57);

    let unmasked = SearchConfig {
        freq_masking: false,
        ..cfg
    };
    let out = run_search(&q, &r, &Blosum62::new(), &unmasked).unwrap();
    let mut scores: Vec<(u32, i32)> = out.hits.iter().map(|h| (h.target_block_id, h.score)).collect();
    scores.sort_unstable();
    assert_eq!(scores, vec![(0, 57), (1, 48)]);
}

#[test]
fn test_stage1_threshold_rejects_short_matches() {
    let (q, r) = sets(&["ACDEFGHIKL"], &["WWACDEFGHIWW"]);
    let out = run_search(&q, &r, &Blosum62::new(), &config()).unwrap();
    assert!(out.hits.is_empty());
    assert_eq!(out.stats.get(Stat::Stage1Compared), 1);
    assert_eq!(out.stats.get(Stat::Stage1Passed), 0);
}

#[test]
fn test_skip_self() {
    let q = SequenceSet::from_ascii(&["ACDEFGHIKL"]).unwrap();
    let cfg = SearchConfig {
        skip_self: true,
        ..config()
    };
    let out = run_search(&q, &q, &Blosum62::new(), &cfg).unwrap();
    assert!(out.hits.is_empty());
    assert_eq!(out.stats.get(Stat::SelfHitsSkipped), 3);

    let out = run_search(&q, &q, &Blosum62::new(), &config()).unwrap();
    assert_eq!(out.hits.len(), 1);
    assert_eq!(out.hits[0].score, 57);
}

#[test]
fn test_soft_masked_residue_removes_covering_seeds() {
    let (q, r) = sets(&["ACdEFGHIKL"], &["XXACDEFGHIKLXX"]);
    let out = run_search(&q, &r, &Blosum62::new(), &config()).unwrap();
    assert!(out.hits.is_empty());
    assert_eq!(out.stats.get(Stat::QuerySeeds), 0);
    assert_eq!(out.stats.get(Stat::SeedsMaskedAtIndex), 3);
}

#[test]
fn test_later_shapes_do_not_repeat_hits() {
    let (q, r) = sets(&["ACDEFGHIKL"], &["XXACDEFGHIKLXX"]);
    let cfg = SearchConfig {
        shapes: vec!["11111111".to_string(), "1111111".to_string()],
        ..config()
    };
    let out = run_search(&q, &r, &Blosum62::new(), &cfg).unwrap();
    assert_eq!(out.hits.len(), 1);
    assert_eq!(out.stats.get(Stat::CollisionRejected), 2 + 4);
}

#[test]
fn test_seed_matches_stream() {
    let (q, r) = sets(&["ACDEFGHIKL"], &["XXACDEFGHIKLXX"]);
    let (matches, stats) = seed_matches(&q, &r, &Blosum62::new(), &config()).unwrap();
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!((m.shape_id, m.query_id, m.query_offset), (0, 0, 0));
    assert_eq!((m.target_block_id, m.subject_offset), (0, 2));
    assert_eq!(m.subject, r.position(0, 2));
    assert_eq!(stats.get(Stat::GappedExtensions), 0);
}

#[test]
fn test_invalid_configuration_is_reported() {
    let (q, r) = sets(&["ACDEFGHIKL"], &["ACDEFGHIKL"]);
    let bad_shape = SearchConfig {
        shapes: vec!["1x11".to_string()],
        ..config()
    };
    assert!(run_search(&q, &r, &Blosum62::new(), &bad_shape).is_err());

    let no_threads = SearchConfig {
        threads: 0,
        ..config()
    };
    let err = run_search(&q, &r, &Blosum62::new(), &no_threads).unwrap_err();
    assert!(format!("{:#}", err).contains("threads"));
}

#[test]
fn test_empty_inputs() {
    let empty = SequenceSet::new();
    let (q, _) = sets(&["ACDEFGHIKL"], &[]);
    let out = run_search(&q, &empty, &Blosum62::new(), &config()).unwrap();
    assert!(out.hits.is_empty());
    let out = run_search(&empty, &q, &Blosum62::new(), &config()).unwrap();
    assert!(out.hits.is_empty());
}
