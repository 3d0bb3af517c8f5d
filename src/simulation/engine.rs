//! Simulation Engine
//!
//! Computes all spins of one parameter set and writes them to
//! `data_circle_<spins>x<steps>_<ratio>.bin`.
//!
//! ## Lifecycle
//! 1. **Skip**: Nothing happens when the final file already exists.
//! 2. **Resume**: A `.tmp` partial whose length is a whole number of records counts as
//!    already computed; only the remaining spins are simulated and appended to it.
//! 3. **Compute**: Spins are spread over a rayon pool. Each spin draws from its own RNG
//!    seeded from `(seed, spin index)`, so results do not depend on the thread count
//!    or on how the run was split by resumes.
//! 4. **Promote**: Once the partial file holds every spin it is renamed to the final name.
//!    A cancelled run keeps what it computed in the partial file.

use super::progress::Progress;
use super::types::{SimulationError, SimulationOutcome, SimulationParams, SpinRecord};
use super::walker::walk_spin;
use crate::synthesis::plan::circle_data_file_name;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Seed of the RNG used for a single spin.
pub fn spin_seed(seed: u64, index: u64) -> u64 {
    seed ^ index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct Simulator {
    params: SimulationParams,
    data_dir: PathBuf,
    progress: Arc<Progress>,
}

impl Simulator {
    pub fn new(params: SimulationParams, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            params,
            data_dir: data_dir.into(),
            progress: Arc::new(Progress::new()),
        }
    }

    pub fn progress(&self) -> Arc<Progress> {
        self.progress.clone()
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(circle_data_file_name(
            self.params.num_spins,
            self.params.num_steps,
            self.params.adim_ratio,
        ))
    }

    pub fn temp_path(&self) -> PathBuf {
        self.output_path().with_extension("tmp")
    }

    /// Runs the simulation until every spin is on disk or `cancel` is raised.
    pub fn run(&self, cancel: &AtomicBool) -> Result<SimulationOutcome, SimulationError> {
        let output = self.output_path();
        if output.exists() {
            tracing::info!("{} already exists, skipping", output.display());
            return Ok(SimulationOutcome::AlreadyExists { path: output });
        }

        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| SimulationError::io(&self.data_dir, e))?;

        let temp = self.temp_path();
        let resumed_from = self.resume_point(&temp)?;
        let remaining = self.params.num_spins.saturating_sub(resumed_from);

        tracing::info!(
            "Computing with {} thread(s), {} steps for {} spins",
            self.params.num_threads,
            self.params.num_steps,
            remaining
        );
        tracing::info!(
            "Diffusion time {}, free diffusion {}, radius {}",
            super::types::DIFF_TIME,
            super::types::DIFF_COEFF,
            self.params.radius()
        );
        if resumed_from > 0 {
            tracing::info!(
                "Resuming from {} spins found in {}",
                resumed_from,
                temp.display()
            );
        }

        self.progress.begin(remaining);
        let records = self.compute(resumed_from, remaining, cancel)?;
        let written = append_records(&temp, resumed_from > 0, &records)?;
        let saved = resumed_from + written;

        tracing::info!(
            "{} bytes of data written to {}",
            written * SpinRecord::SIZE as u64,
            temp.display()
        );

        if saved < self.params.num_spins {
            tracing::warn!(
                "Computing was stopped after {} of {} spins",
                saved,
                self.params.num_spins
            );
            return Ok(SimulationOutcome::Cancelled {
                temp_path: temp,
                spins_saved: saved,
            });
        }

        std::fs::rename(&temp, &output).map_err(|e| SimulationError::io(&output, e))?;
        tracing::info!("Moved data from {} to {}", temp.display(), output.display());

        Ok(SimulationOutcome::Completed {
            path: output,
            spins_computed: written,
            resumed_from,
        })
    }

    /// Number of whole records already present in the partial file.
    fn resume_point(&self, temp: &Path) -> Result<u64, SimulationError> {
        if !temp.exists() {
            return Ok(0);
        }

        let len = std::fs::metadata(temp)
            .map_err(|e| SimulationError::io(temp, e))?
            .len();
        let record = SpinRecord::SIZE as u64;

        if len % record != 0 {
            tracing::warn!(
                "{} holds a partial record ({} bytes), starting over",
                temp.display(),
                len
            );
            return Ok(0);
        }

        let spins = len / record;
        if spins > self.params.num_spins {
            tracing::warn!(
                "{} holds {} spins, more than the {} requested, starting over",
                temp.display(),
                spins,
                self.params.num_spins
            );
            return Ok(0);
        }

        Ok(spins)
    }

    fn compute(
        &self,
        first_index: u64,
        count: u64,
        cancel: &AtomicBool,
    ) -> Result<Vec<Option<SpinRecord>>, SimulationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.num_threads)
            .build()?;

        let params = &self.params;
        let progress = &self.progress;

        let records = pool.install(|| {
            (0..count as usize)
                .into_par_iter()
                .map(|offset| {
                    let index = first_index + offset as u64;
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    let mut rng = StdRng::seed_from_u64(spin_seed(params.seed, index));
                    let record = walk_spin(params, &mut rng);
                    progress.inc();
                    Some(record)
                })
                .collect()
        });

        Ok(records)
    }
}

/// Appends the computed records, in spin order, to the partial file.
///
/// Only the leading run of computed spins is kept: spins after the first one skipped by a
/// cancellation are dropped, so the file length always matches the next spin index to
/// compute. Returns the number of records written.
fn append_records(
    temp: &Path,
    append: bool,
    records: &[Option<SpinRecord>],
) -> Result<u64, SimulationError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(temp)
        .map_err(|e| SimulationError::io(temp, e))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0u64;
    for record in records.iter().map_while(|record| record.as_ref()) {
        writer
            .write_all(&record.to_bytes())
            .map_err(|e| SimulationError::io(temp, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| SimulationError::io(temp, e))?;

    Ok(written)
}
