//! Seed joins
//!
//! Partition relations are joined on their keys with `hash_join`; matching
//! seed locations come back grouped per key in a pair of `DoubleArray`s.

pub mod double_array;
pub mod hash_join;
pub mod radix;
pub mod relation;

pub use double_array::DoubleArray;
pub use hash_join::{hash_join, JoinConfig, JoinResult};
pub use relation::{JoinRecord, Relation, SeedEntry};
