//! Core value types shared by every stage
//!
//! - **Packed positions** (`packed`): 40-bit buffer offsets, optional block ids

pub mod packed;

pub use packed::{PackedPosition, PackedPositionId, SeedLoc};
