//! Restricted Diffusion Simulation Module
//!
//! Produces the spin record files the rest of the pipeline consumes. Each spin performs a
//! gaussian random walk confined to a circle and accumulates the NMR phase it would pick up
//! under three gradient shapes (narrow pulse, bipolar square, sine).
//!
//! ## Submodules
//! - **`types`**: Spin records, run parameters, outcomes and errors.
//! - **`walker`**: The per-spin random walk.
//! - **`engine`**: Parallel computation, resumable partial files and promotion to the final name.
//! - **`progress`**: Shared spin counter and remaining-time estimate for the reporter.

pub mod engine;
pub mod progress;
pub mod types;
pub mod walker;
