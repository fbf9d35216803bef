//! Search counters
//!
//! Every worker owns a `Statistics` and the driver merges them after each
//! parallel phase. The summary table goes to stderr only when diagnostics
//! are enabled through the SEEDJOIN_DIAGNOSTICS environment variable.

use std::time::Duration;

use log::info;

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("SEEDJOIN_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    QuerySeeds,
    ReferenceSeeds,
    SeedsMaskedAtIndex,
    JoinedGroups,
    SeedHits,
    FrequencyMaskedGroups,
    FrequencyMaskedPositions,
    ComplexityMaskedGroups,
    ComplexityMaskedPositions,
    Stage1Compared,
    Stage1Passed,
    SelfHitsSkipped,
    CollisionRejected,
    UngappedRejected,
    GappedExtensions,
    ExtensionCells,
    LowScoreRejected,
    HitsEmitted,
    TimeIndexMicros,
    TimeJoinMicros,
    TimeMaskMicros,
    TimeSearchMicros,
}

impl Stat {
    pub const COUNT: usize = 22;

    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::QuerySeeds,
        Stat::ReferenceSeeds,
        Stat::SeedsMaskedAtIndex,
        Stat::JoinedGroups,
        Stat::SeedHits,
        Stat::FrequencyMaskedGroups,
        Stat::FrequencyMaskedPositions,
        Stat::ComplexityMaskedGroups,
        Stat::ComplexityMaskedPositions,
        Stat::Stage1Compared,
        Stat::Stage1Passed,
        Stat::SelfHitsSkipped,
        Stat::CollisionRejected,
        Stat::UngappedRejected,
        Stat::GappedExtensions,
        Stat::ExtensionCells,
        Stat::LowScoreRejected,
        Stat::HitsEmitted,
        Stat::TimeIndexMicros,
        Stat::TimeJoinMicros,
        Stat::TimeMaskMicros,
        Stat::TimeSearchMicros,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stat::QuerySeeds => "Query seeds indexed",
            Stat::ReferenceSeeds => "Reference seeds indexed",
            Stat::SeedsMaskedAtIndex => "Seeds skipped (masked)",
            Stat::JoinedGroups => "Joined seed groups",
            Stat::SeedHits => "Seed hits (joined pairs)",
            Stat::FrequencyMaskedGroups => "Groups masked (frequency)",
            Stat::FrequencyMaskedPositions => "Positions masked (frequency)",
            Stat::ComplexityMaskedGroups => "Groups masked (complexity)",
            Stat::ComplexityMaskedPositions => "Positions masked (complexity)",
            Stat::Stage1Compared => "Fingerprint pairs compared",
            Stat::Stage1Passed => "Fingerprint pairs passed",
            Stat::SelfHitsSkipped => "Self hits skipped",
            Stat::CollisionRejected => "Non-primary hits",
            Stat::UngappedRejected => "Ungapped check failed",
            Stat::GappedExtensions => "Gapped extensions",
            Stat::ExtensionCells => "DP cells computed",
            Stat::LowScoreRejected => "Extensions below min score",
            Stat::HitsEmitted => "Hits emitted",
            Stat::TimeIndexMicros => "Index build (us)",
            Stat::TimeJoinMicros => "Join + sampling (us)",
            Stat::TimeMaskMicros => "Masking (us)",
            Stat::TimeSearchMicros => "Stage 1 + extension (us)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    counters: [u64; Stat::COUNT],
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            counters: [0; Stat::COUNT],
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&mut self, stat: Stat) {
        self.counters[stat as usize] += 1;
    }

    #[inline]
    pub fn add(&mut self, stat: Stat, n: u64) {
        self.counters[stat as usize] += n;
    }

    pub fn add_time(&mut self, stat: Stat, elapsed: Duration) {
        self.add(stat, elapsed.as_micros() as u64);
    }

    #[inline]
    pub fn get(&self, stat: Stat) -> u64 {
        self.counters[stat as usize]
    }

    pub fn merge(&mut self, other: &Statistics) {
        for (a, b) in self.counters.iter_mut().zip(other.counters.iter()) {
            *a += b;
        }
    }

    /// Print all counters to stderr.
    pub fn print_summary(&self) {
        eprintln!("\n=== Seed Search Diagnostics ===");
        for stat in Stat::ALL {
            eprintln!("  {:<32}{}", format!("{}:", stat.label()), self.get(stat));
        }
        let compared = self.get(Stat::Stage1Compared);
        if compared > 0 {
            eprintln!(
                "  Fingerprint pass rate:          {:.4}%",
                100.0 * self.get(Stat::Stage1Passed) as f64 / compared as f64
            );
        }
        eprintln!("================================\n");
    }

    pub fn log_summary(&self) {
        info!(
            "seed hits={} stage1 passed={} extensions={} hits={} cells={}",
            self.get(Stat::SeedHits),
            self.get(Stat::Stage1Passed),
            self.get(Stat::GappedExtensions),
            self.get(Stat::HitsEmitted),
            self.get(Stat::ExtensionCells),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_merge() {
        let mut a = Statistics::new();
        a.inc(Stat::SeedHits);
        a.add(Stat::ExtensionCells, 40);
        let mut b = Statistics::new();
        b.add(Stat::SeedHits, 2);
        b.inc(Stat::HitsEmitted);
        a.merge(&b);
        assert_eq!(a.get(Stat::SeedHits), 3);
        assert_eq!(a.get(Stat::ExtensionCells), 40);
        assert_eq!(a.get(Stat::HitsEmitted), 1);
        assert_eq!(a.get(Stat::Stage1Passed), 0);
    }

    #[test]
    fn test_all_lists_every_counter_once() {
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(*stat as usize, i);
        }
    }
}
