//! Search configuration

use std::fmt;
use std::str::FromStr;

use crate::align::splice::ExtensionParams;
use crate::align::xdrop::{ExtensionMode, GapCosts, MAX_COST};
use crate::error::{Result, SearchError};
use crate::join::hash_join::JoinConfig;
use crate::seed::reduction::DEFAULT_REDUCTION;
use crate::stage1::fingerprint::Backend;

/// Stage-1 backend request; `Auto` picks the widest supported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage1Backend {
    #[default]
    Auto,
    Scalar,
    Lanes16,
    Lanes32,
    Swar64,
}

impl Stage1Backend {
    pub fn resolve(self) -> Result<Backend> {
        let backend = match self {
            Stage1Backend::Auto => return Ok(Backend::detect()),
            Stage1Backend::Scalar => Backend::Scalar,
            Stage1Backend::Lanes16 => Backend::Lanes16,
            Stage1Backend::Lanes32 => Backend::Lanes32,
            Stage1Backend::Swar64 => Backend::Swar64,
        };
        if !backend.is_supported() {
            return Err(SearchError::invalid_config(format!(
                "stage-1 backend {} is not supported on this CPU",
                backend
            )));
        }
        Ok(backend)
    }
}

impl FromStr for Stage1Backend {
    type Err = SearchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Stage1Backend::Auto);
        }
        Ok(match s.parse::<Backend>()? {
            Backend::Scalar => Stage1Backend::Scalar,
            Backend::Lanes16 => Stage1Backend::Lanes16,
            Backend::Lanes32 => Stage1Backend::Lanes32,
            Backend::Swar64 => Stage1Backend::Swar64,
        })
    }
}

impl fmt::Display for Stage1Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage1Backend::Auto => f.write_str("auto"),
            Stage1Backend::Scalar => f.write_str("scalar"),
            Stage1Backend::Lanes16 => f.write_str("lanes16"),
            Stage1Backend::Lanes32 => f.write_str("lanes32"),
            Stage1Backend::Swar64 => f.write_str("swar64"),
        }
    }
}

/// All knobs of a search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub threads: usize,
    /// Seed shapes as 0/1 strings, searched in order.
    pub shapes: Vec<String>,
    pub reduction: String,
    pub partition_bits: u32,
    pub key_bit_budget: u32,
    pub index_chunks: usize,

    // Join
    pub join_split_size: usize,
    pub join_split_key_len: u32,
    pub radix_bits: u32,
    pub join_ht_factor: f64,
    pub hash_join_swap: bool,

    // Seed filters
    pub freq_masking: bool,
    pub freq_sd: f64,
    pub seed_cut: f64,

    // Stage 1 and 2
    pub min_identities: u32,
    pub stage1_backend: Stage1Backend,
    pub collision_window: usize,
    pub ungapped_window: usize,
    pub min_ungapped_score: i32,
    pub ungapped_xdrop: i32,

    // Gapped extension
    pub gap_open: i32,
    pub gap_extend: i32,
    pub gap_unaligned: i32,
    pub frameshift: i32,
    pub xdrop: i32,
    pub min_score: i32,
    pub mode: ExtensionMode,
    pub traceback: bool,

    pub resolve_block_ids: bool,
    pub skip_self: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            shapes: vec!["11111111".to_string()],
            reduction: DEFAULT_REDUCTION.to_string(),
            partition_bits: 8,
            key_bit_budget: 32,
            index_chunks: 1,
            join_split_size: 100_000,
            join_split_key_len: 17,
            radix_bits: 8,
            join_ht_factor: 1.3,
            hash_join_swap: true,
            freq_masking: true,
            freq_sd: 50.0,
            seed_cut: 0.9,
            min_identities: 10,
            stage1_backend: Stage1Backend::Auto,
            collision_window: 48,
            ungapped_window: 48,
            min_ungapped_score: 0,
            ungapped_xdrop: 12,
            gap_open: 11,
            gap_extend: 1,
            gap_unaligned: MAX_COST,
            frameshift: 15,
            xdrop: 20,
            min_score: 0,
            mode: ExtensionMode::Local,
            traceback: true,
            resolve_block_ids: false,
            skip_self: false,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(SearchError::invalid_config("threads must be at least 1"));
        }
        if self.shapes.is_empty() {
            return Err(SearchError::invalid_config("at least one seed shape is required"));
        }
        if self.shapes.len() > u8::MAX as usize - 1 {
            return Err(SearchError::invalid_config(format!(
                "{} shapes given, at most {} supported",
                self.shapes.len(),
                u8::MAX - 1
            )));
        }
        if self.index_chunks == 0 || self.index_chunks > 1usize << self.partition_bits.min(16) {
            return Err(SearchError::invalid_config(format!(
                "index chunks {} must lie in 1..={}",
                self.index_chunks,
                1usize << self.partition_bits.min(16)
            )));
        }
        if self.radix_bits == 0 || self.radix_bits > 16 {
            return Err(SearchError::invalid_config(format!(
                "radix bits {} must lie in 1..=16",
                self.radix_bits
            )));
        }
        if self.join_ht_factor.is_nan() || self.join_ht_factor < 1.0 {
            return Err(SearchError::invalid_config(format!(
                "hash table factor {} must be at least 1",
                self.join_ht_factor
            )));
        }
        if !self.freq_sd.is_finite() || self.freq_sd < 0.0 {
            return Err(SearchError::invalid_config(format!(
                "frequency sd factor {} must be a non-negative number",
                self.freq_sd
            )));
        }
        if !self.seed_cut.is_finite() {
            return Err(SearchError::invalid_config("seed complexity cut must be finite"));
        }
        if self.xdrop < 0 || self.ungapped_xdrop < 0 {
            return Err(SearchError::invalid_config("X-drop values must be non-negative"));
        }
        self.gap_costs().validate()
    }

    pub fn gap_costs(&self) -> GapCosts {
        GapCosts {
            open: self.gap_open,
            extend: self.gap_extend,
            unaligned: self.gap_unaligned,
            frameshift: self.frameshift,
        }
    }

    pub fn join_config(&self) -> JoinConfig {
        JoinConfig {
            split_size: self.join_split_size,
            split_key_len: self.join_split_key_len,
            radix_bits: self.radix_bits,
            ht_factor: self.join_ht_factor,
            swap: self.hash_join_swap,
            threads: self.threads,
        }
    }

    pub fn extension_params(&self) -> ExtensionParams {
        ExtensionParams {
            costs: self.gap_costs(),
            xdrop: self.xdrop,
            mode: self.mode,
            traceback: self.traceback,
        }
    }
}
