//! Mixed Dataset Synthesis Module
//!
//! Builds datasets mixing spins from a small circle and a big circle. For a small radius `r`
//! and big radius `R`, the share drawn from the small circle is proportional to its area,
//! `r² / (r² + R²)`, out of a fixed total record count.
//!
//! Each output is the first `small` records of the small-circle file followed by the first
//! `big` records of the big-circle file. Records are fixed-size blocks of
//! `shapes_per_record * 8` bytes and are never split.
//!
//! ## Submodules
//! - **`plan`**: Area-proportional split and file naming.
//! - **`records`**: Exact byte-range copy of whole records.
//! - **`mixer`**: Assembly of each output file and the sequential run over all radii.
//! - **`types`**: Plan, outcome and error types.

pub mod mixer;
pub mod plan;
pub mod records;
pub mod types;
