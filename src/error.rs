//! Error types for the seed-join and extension core
//!
//! Every variant here is fatal for the unit of work that raised it. Heuristic
//! losses (masked seeds, X-drop truncation, stage-1 rejects) are never errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Two relations fed to the same join were built with different key widths.
    #[error("key width mismatch between joined relations: {left} vs {right} bits")]
    KeyWidthMismatch { left: u32, right: u32 },

    #[error("seed weight {weight} exceeds the supported maximum of {max}")]
    SeedWeightTooLarge { weight: usize, max: usize },

    #[error("invalid seed shape: {0}")]
    InvalidShape(String),

    #[error("unsupported gap costs: {0}")]
    UnsupportedGapCosts(String),

    #[error("position {pos} out of range (limit {limit})")]
    PositionOutOfRange { pos: u64, limit: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to allocate {entries} entries for {what}")]
    Allocation { what: &'static str, entries: usize },

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        SearchError::InvalidConfig(msg.into())
    }

    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        SearchError::InvalidShape(msg.into())
    }

    pub fn gap_costs(msg: impl Into<String>) -> Self {
        SearchError::UnsupportedGapCosts(msg.into())
    }
}

/// Allocate an empty vector with room for `entries` values, reporting
/// allocator failure as a typed error instead of aborting.
pub fn try_with_capacity<T>(entries: usize, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(entries)
        .map_err(|_| SearchError::Allocation { what, entries })?;
    Ok(v)
}
