use crate::config::{ConfigError, SimulationConfig};
use std::path::PathBuf;

/// Diffusion coefficient. Space and time are expressed in units where D = T = 1.
pub const DIFF_COEFF: f64 = 1.0;
/// Total diffusion time.
pub const DIFF_TIME: f64 = 1.0;

/// Accumulated NMR phases of one spin for three gradient shapes.
///
/// Serialized as three little-endian `f64`, in field order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinRecord {
    /// Narrow-pulse gradient: start position minus end position.
    pub phase_delta: f64,
    /// Bipolar square gradient, sign flipped halfway through.
    pub phase_square: f64,
    /// One full period of a sine gradient.
    pub phase_sin: f64,
}

impl SpinRecord {
    pub const SIZE: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.phase_delta.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.phase_square.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.phase_sin.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let field = |i: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            f64::from_le_bytes(raw)
        };
        Some(Self {
            phase_delta: field(0),
            phase_square: field(1),
            phase_sin: field(2),
        })
    }
}

/// Physical and run parameters of one simulation.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub num_spins: u64,
    pub num_steps: u64,
    pub num_threads: usize,
    pub adim_ratio: f64,
    pub seed: u64,
}

impl SimulationParams {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            num_spins: config.num_spins,
            num_steps: config.num_steps,
            num_threads: config.num_threads,
            adim_ratio: config.adim_ratio,
            seed: config.seed.unwrap_or_else(rand::random),
        })
    }

    /// Time step.
    pub fn dt(&self) -> f64 {
        DIFF_TIME / self.num_steps as f64
    }

    /// Circle radius, `adim_ratio` times the free diffusion length.
    pub fn radius(&self) -> f64 {
        self.adim_ratio * (2.0 * DIFF_COEFF * DIFF_TIME).sqrt()
    }

    /// Standard deviation of a single step along each axis.
    pub fn step_deviation(&self) -> f64 {
        (2.0 * DIFF_COEFF * self.dt()).sqrt()
    }

    /// Phase advance of the sine gradient per step.
    pub fn sin_phase_step(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.num_steps as f64
    }
}

/// How a simulation run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// The output file was already there; nothing was computed.
    AlreadyExists { path: PathBuf },
    /// All spins are on disk under the final name.
    Completed {
        path: PathBuf,
        spins_computed: u64,
        resumed_from: u64,
    },
    /// Stopped early. The partial file stays in place for a later resume.
    Cancelled { temp_path: PathBuf, spins_saved: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SimulationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
