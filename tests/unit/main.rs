//! Integration tests for seedjoin
//!
//! - `helpers` - reference implementations (naive join, full Gotoh DP)
//! - `join` - hash join and radix clustering against the naive join
//! - `seed` - seed index partitioning and neighborhoods
//! - `stage1` - fingerprint backends against the scalar count
//! - `xdrop` - gapped X-drop extension against full DP
//! - `pipeline` - end-to-end searches

mod helpers;
mod join;
mod pipeline;
mod seed;
mod stage1;
mod xdrop;
