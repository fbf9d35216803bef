//! Seeds
//!
//! - **Alphabet reduction** (`reduction`): residue classes used for packing
//! - **Shapes** (`shape`): spaced seed patterns, packing, reduced-letter match
//! - **Neighborhoods** (`neighborhood`): seeds scoring above a threshold
//! - **Index** (`index`): partitioned, key-sorted seed tables

pub mod index;
pub mod neighborhood;
pub mod reduction;
pub mod shape;

pub use index::{
    IndexParams, KeyEncoding, KeySetFilter, NoFilter, PartitionRange, Partitioning, SeedFilter,
    SeedIndex, SeedIndexStats,
};
pub use reduction::Reduction;
pub use shape::Shape;
