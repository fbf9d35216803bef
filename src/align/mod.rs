//! Seed extension
//!
//! - **Ungapped window score** (`ungapped`): cheap diagonal pre-check
//! - **Gapped X-drop** (`xdrop`): antidiagonal DP, standard and 3-frame
//! - **Splicing** (`splice`): left and right extension around a seed
//! - **Results** (`result`): segments, edit script, statistics

pub mod result;
pub mod splice;
pub mod ungapped;
pub mod xdrop;

pub use result::{AlignmentResult, DiagonalSegment, EditOp};
pub use splice::{extend_seed, extend_translated, ExtensionParams, Extender};
pub use ungapped::{ungapped_window_score, UngappedScore};
pub use xdrop::{Chunk, ExtensionMode, GapCosts, GappedXdropAligner, XdropEnd};
