use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Validation failures for a loaded configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{section}.{field}: {reason}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(section: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            section,
            field,
            reason: reason.into(),
        }
    }
}

/// Root configuration, one table per batch job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl PipelineConfig {
    /// Loads the configuration from `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}

/// Settings of the bootstrap job runner.
///
/// The external tool is a standalone jar run through `java`. Unless `command` is set,
/// the base command is assembled from the individual fields:
/// `java <jvm_options> -jar <tool_path> -v <verbosity> -b <batches> -s <boot_size>`.
/// Each task then appends `<input_flag> <input path>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Directory holding the simulation record files.
    #[serde(default = "default_data_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving one log file per input.
    #[serde(default = "default_current_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_java")]
    pub java: String,

    #[serde(default = "default_jvm_options")]
    pub jvm_options: Vec<String>,

    /// Path of the bootstrap analysis jar.
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,

    #[serde(default = "default_verbosity")]
    pub verbosity: u32,

    /// Number of bootstrap batches (`-b`).
    #[serde(default = "default_batches")]
    pub batches: u32,

    /// Resamples per batch (`-s`).
    #[serde(default = "default_boot_size")]
    pub boot_size: u32,

    #[serde(default = "default_input_flag")]
    pub input_flag: String,

    /// Verbatim base command. Replaces the java template when present.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Maximum number of tool processes running at the same time.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    #[serde(default = "default_input_files")]
    pub input_files: Vec<String>,

    /// Appended to the input file stem to form the log name (`<stem><suffix>.txt`).
    #[serde(default = "default_log_suffix")]
    pub log_suffix: String,

    /// Kill a tool process after this many seconds. No limit when unset.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,

    /// Where to write the JSON run report. No report file when unset.
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            input_dir: default_data_dir(),
            output_dir: default_current_dir(),
            java: default_java(),
            jvm_options: default_jvm_options(),
            tool_path: default_tool_path(),
            verbosity: default_verbosity(),
            batches: default_batches(),
            boot_size: default_boot_size(),
            input_flag: default_input_flag(),
            command: None,
            num_workers: default_num_workers(),
            input_files: default_input_files(),
            log_suffix: default_log_suffix(),
            task_timeout_secs: None,
            report_file: None,
        }
    }
}

impl BootstrapConfig {
    /// The command shared by every task, before the per-file input flag is appended.
    pub fn base_command(&self) -> Vec<String> {
        if let Some(command) = &self.command {
            return command.clone();
        }

        let mut command = vec![self.java.clone()];
        command.extend(self.jvm_options.iter().cloned());
        command.extend([
            "-jar".to_string(),
            self.tool_path.display().to_string(),
            "-v".to_string(),
            self.verbosity.to_string(),
            "-b".to_string(),
            self.batches.to_string(),
            "-s".to_string(),
            self.boot_size.to_string(),
        ]);
        command
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers == 0 {
            return Err(ConfigError::invalid(
                "bootstrap",
                "num_workers",
                "must be at least 1",
            ));
        }
        if self.input_files.is_empty() {
            return Err(ConfigError::invalid(
                "bootstrap",
                "input_files",
                "at least one input file is required",
            ));
        }
        if let Some(command) = &self.command {
            if command.is_empty() {
                return Err(ConfigError::invalid(
                    "bootstrap",
                    "command",
                    "must name a program",
                ));
            }
        }
        if self.task_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "bootstrap",
                "task_timeout_secs",
                "must be positive when set",
            ));
        }
        Ok(())
    }
}

/// Settings of the mixed dataset synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Directory holding the source record files.
    #[serde(default = "default_current_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_current_dir")]
    pub output_dir: PathBuf,

    /// Records in every output file.
    #[serde(default = "default_total_records")]
    pub total_records: u64,

    /// Numeric fields per record, each one an 8-byte float.
    #[serde(default = "default_shapes_per_record")]
    pub shapes_per_record: u64,

    #[serde(default = "default_big_radius")]
    pub big_radius: f64,

    /// Small-circle radii, one output file per entry.
    #[serde(default = "default_radii")]
    pub radii: Vec<f64>,

    /// Spin count encoded in the source file names.
    #[serde(default = "default_source_spins")]
    pub source_spins: u64,

    /// Step count encoded in the source file names.
    #[serde(default = "default_source_steps")]
    pub source_steps: u64,

    /// File name of the big-circle source. Defaults to the source named after `big_radius`.
    #[serde(default)]
    pub big_source: Option<String>,

    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            data_dir: default_current_dir(),
            output_dir: default_current_dir(),
            total_records: default_total_records(),
            shapes_per_record: default_shapes_per_record(),
            big_radius: default_big_radius(),
            radii: default_radii(),
            source_spins: default_source_spins(),
            source_steps: default_source_steps(),
            big_source: None,
            output_suffix: default_output_suffix(),
        }
    }
}

impl SynthesisConfig {
    /// Size of one record in bytes.
    pub fn record_size(&self) -> u64 {
        self.shapes_per_record * 8
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shapes_per_record == 0 {
            return Err(ConfigError::invalid(
                "synthesis",
                "shapes_per_record",
                "must be at least 1",
            ));
        }
        if !(self.big_radius.is_finite() && self.big_radius > 0.0) {
            return Err(ConfigError::invalid(
                "synthesis",
                "big_radius",
                format!("must be a positive number, got {}", self.big_radius),
            ));
        }
        if self.output_suffix.is_empty() {
            return Err(ConfigError::invalid(
                "synthesis",
                "output_suffix",
                "must not be empty, outputs would be named like their sources",
            ));
        }
        if self.radii.is_empty() {
            return Err(ConfigError::invalid(
                "synthesis",
                "radii",
                "at least one radius is required",
            ));
        }
        for &radius in &self.radii {
            if !(radius.is_finite() && radius > 0.0 && radius <= self.big_radius) {
                return Err(ConfigError::invalid(
                    "synthesis",
                    "radii",
                    format!(
                        "radius {} is outside (0, {}]",
                        radius, self.big_radius
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Settings of the spin simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Directory receiving the record files (and their `.tmp` partials).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_source_spins")]
    pub num_spins: u64,

    #[serde(default = "default_source_steps")]
    pub num_steps: u64,

    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Circle radius relative to the free diffusion length `sqrt(2 D T)`.
    #[serde(default = "default_big_radius")]
    pub adim_ratio: f64,

    /// Fixed RNG seed. Each run draws a fresh seed when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            num_spins: default_source_spins(),
            num_steps: default_source_steps(),
            num_threads: default_num_threads(),
            adim_ratio: default_big_radius(),
            seed: None,
            progress_interval_secs: default_progress_interval(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_spins == 0 {
            return Err(ConfigError::invalid(
                "simulation",
                "num_spins",
                "must be at least 1",
            ));
        }
        if self.num_steps == 0 {
            return Err(ConfigError::invalid(
                "simulation",
                "num_steps",
                "must be at least 1",
            ));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::invalid(
                "simulation",
                "num_threads",
                "must be at least 1",
            ));
        }
        if !(self.adim_ratio.is_finite() && self.adim_ratio > 0.0) {
            return Err(ConfigError::invalid(
                "simulation",
                "adim_ratio",
                format!("must be a positive number, got {}", self.adim_ratio),
            ));
        }
        if self.progress_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "simulation",
                "progress_interval_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_current_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_java() -> String {
    "java".to_string()
}

fn default_jvm_options() -> Vec<String> {
    vec!["-Xms2G".to_string(), "-Xmx2G".to_string()]
}

fn default_tool_path() -> PathBuf {
    PathBuf::from("incanter-processing-0.1.0-SNAPSHOT-standalone.jar")
}

fn default_verbosity() -> u32 {
    2
}

fn default_batches() -> u32 {
    10
}

fn default_boot_size() -> u32 {
    10_000
}

fn default_input_flag() -> String {
    "-f".to_string()
}

fn default_num_workers() -> usize {
    24
}

fn default_input_files() -> Vec<String> {
    let ratios = ["0.1", "0.2", "0.3", "0.4", "0.5", "0.6", "0.7", "0.8", "0.9", "1"];
    let pure = ratios
        .iter()
        .map(|ratio| format!("data_circle_100000x100000_{}.bin", ratio));
    let mixed = ratios
        .iter()
        .map(|ratio| format!("data_circle_100000x100000_{}-1.bin", ratio));
    pure.chain(mixed).collect()
}

fn default_log_suffix() -> String {
    "-bootstrap".to_string()
}

fn default_total_records() -> u64 {
    100_000
}

fn default_shapes_per_record() -> u64 {
    3
}

fn default_big_radius() -> f64 {
    1.0
}

fn default_radii() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
}

fn default_source_spins() -> u64 {
    100_000
}

fn default_source_steps() -> u64 {
    100_000
}

fn default_output_suffix() -> String {
    "-1".to_string()
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_progress_interval() -> u64 {
    15
}
