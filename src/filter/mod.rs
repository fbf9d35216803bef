//! Seed filters applied between the join and the search phase

pub mod complexity;
pub mod frequency;

pub use complexity::{mask_low_complexity, ComplexityFilter};
pub use frequency::{mask_frequent, merge_slots, FrequencySampler, MaskCounts};
