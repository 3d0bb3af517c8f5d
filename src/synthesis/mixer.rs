//! Output file assembly.
//!
//! Each output is written to `<output>.tmp` first and only renamed into place once it
//! holds exactly `total_records` records, so a failed radius never leaves an undersized
//! file behind under the final name.

use super::records::copy_records;
use super::types::{PlanEntry, SynthesisError, SynthesisOutcome, SynthesisPlan};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn temp_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Builds one output file: the small-circle records first, then the big-circle records.
pub fn synthesize_entry(plan: &SynthesisPlan, entry: &PlanEntry) -> Result<u64, SynthesisError> {
    let temp = temp_path(&entry.output);

    match write_mixture(plan, entry, &temp) {
        Ok(written) => {
            std::fs::rename(&temp, &entry.output)
                .map_err(|e| SynthesisError::io(&entry.output, e))?;
            Ok(written)
        }
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_file(&temp) {
                tracing::debug!("Could not remove {}: {}", temp.display(), cleanup);
            }
            Err(e)
        }
    }
}

fn write_mixture(
    plan: &SynthesisPlan,
    entry: &PlanEntry,
    temp: &Path,
) -> Result<u64, SynthesisError> {
    let file = File::create(temp).map_err(|e| SynthesisError::io(temp, e))?;
    let mut writer = BufWriter::new(file);

    let mut written = copy_records(
        &entry.small_source,
        0,
        entry.counts.small,
        plan.record_size,
        &mut writer,
    )?;
    written += copy_records(
        &entry.big_source,
        0,
        entry.counts.big,
        plan.record_size,
        &mut writer,
    )?;

    writer.flush().map_err(|e| SynthesisError::io(temp, e))?;

    let actual = std::fs::metadata(temp)
        .map_err(|e| SynthesisError::io(temp, e))?
        .len();
    if actual != plan.output_len() || written != actual {
        return Err(SynthesisError::SizeMismatch {
            path: temp.to_path_buf(),
            expected: plan.output_len(),
            actual,
        });
    }

    Ok(written)
}

/// Builds every output file of the plan in order.
///
/// A failure on one radius is logged and recorded; the remaining radii are still processed.
pub fn run_synthesis(plan: &SynthesisPlan) -> Vec<SynthesisOutcome> {
    tracing::info!(
        "Synthesizing {} datasets of {} records ({} bytes each)",
        plan.entries.len(),
        plan.total_records,
        plan.output_len()
    );

    plan.entries
        .iter()
        .map(|entry| {
            tracing::info!(
                "Writing {} ({} records from {}, {} from {})",
                entry.output.display(),
                entry.counts.small,
                entry.small_source.display(),
                entry.counts.big,
                entry.big_source.display()
            );

            let result = synthesize_entry(plan, entry);
            if let Err(e) = &result {
                tracing::error!("Radius {} failed: {}", entry.radius, e);
            }

            SynthesisOutcome {
                radius: entry.radius,
                output: entry.output.clone(),
                result,
            }
        })
        .collect()
}
