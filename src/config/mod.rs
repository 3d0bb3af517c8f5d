//! Pipeline Configuration Module
//!
//! All paths, worker counts and file lists used by the three batch jobs live here
//! instead of being compiled in. A single TOML file carries one table per job:
//!
//! ```toml
//! [bootstrap]
//! input_dir = "/data/dif_circle/data"
//! tool_path = "/opt/incanter-processing/standalone.jar"
//! num_workers = 24
//!
//! [synthesis]
//! data_dir = "data"
//! radii = [0.1, 0.5, 1.0]
//!
//! [simulation]
//! num_spins = 100000
//! adim_ratio = 0.5
//! ```
//!
//! Every field has a default matching the values the lab scripts historically used,
//! so an empty file (or no file at all) is a valid configuration.
//!
//! ## Submodules
//! - **`types`**: The configuration structures, their serde defaults and validation.

pub mod types;

pub use types::{
    BootstrapConfig, ConfigError, PipelineConfig, SimulationConfig, SynthesisConfig,
};
