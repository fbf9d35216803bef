//! Per-worker scratch space
//!
//! Buffers are reused across partitions and groups so the search loop does
//! not allocate per pair.

use crate::align::splice::Extender;
use crate::search::hit::Hit;
use crate::search::SeedMatch;
use crate::search::stats::Statistics;
use crate::stage1::fingerprint::FingerPrint;

#[derive(Debug, Default)]
pub struct WorkSet {
    pub worker: usize,
    pub stats: Statistics,
    pub hits: Vec<Hit>,
    pub matches: Vec<SeedMatch>,
    pub query_prints: Vec<FingerPrint>,
    pub reference_prints: Vec<FingerPrint>,
    /// Stage-1 survivors of the current group: (query index, reference index).
    pub pairs: Vec<(u32, u32)>,
    pub extender: Extender,
}

impl WorkSet {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Default::default()
        }
    }
}
