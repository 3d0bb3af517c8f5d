//! Circle Diffusion Pipeline Library
//!
//! Batch tooling around the restricted-diffusion-in-a-circle simulations.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Modules
//! - **`simulation`**: Monte Carlo spin simulator producing fixed-size phase records, with
//!   resumable partial output.
//! - **`synthesis`**: Builds mixed datasets by concatenating whole records from a small-circle
//!   and a big-circle file, split in proportion to the circles' areas.
//! - **`executor`**: Runs the external bootstrap-resampling tool once per dataset with a bounded
//!   number of concurrent processes, capturing each run's output to a log file.
//! - **`config`**: TOML configuration shared by the three jobs.

pub mod config;
pub mod executor;
pub mod simulation;
pub mod synthesis;
