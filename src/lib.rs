//! Partitioned seed join and X-drop extension core for protein search.

pub mod error;
pub mod config;

pub mod core;
pub mod sequence;
pub mod utils;

pub mod seed;
pub mod join;
pub mod filter;
pub mod stage1;
pub mod align;
pub mod search;

pub use config::{SearchConfig, Stage1Backend};
pub use error::{Result, SearchError};
pub use search::{run_search, seed_matches, Hit, SearchOutput, SeedMatch, Statistics};
pub use sequence::{SequenceCollection, SequenceSet};
