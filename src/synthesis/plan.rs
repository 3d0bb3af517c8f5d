use super::types::{PlanEntry, SplitCounts, SynthesisError, SynthesisPlan};
use crate::config::{ConfigError, SynthesisConfig};

use std::path::Path;

/// Splits `total` records between the small and the big circle in proportion to their areas.
///
/// `small = round(total * r² / (r² + R²))`, rounding halves away from zero, and
/// `big = total - small`, so the two always add up to `total`.
pub fn split_counts(radius: f64, big_radius: f64, total: u64) -> SplitCounts {
    let small_area = radius * radius;
    let big_area = big_radius * big_radius;

    let small = (total as f64 * small_area / (small_area + big_area)).round() as u64;
    let small = small.min(total);

    SplitCounts {
        small,
        big: total - small,
    }
}

/// Name of a simulation record file, e.g. `data_circle_100000x100000_0.5.bin`.
///
/// The ratio uses the shortest float rendering, so `1.0` becomes `1`.
pub fn circle_data_file_name(spins: u64, steps: u64, ratio: f64) -> String {
    format!("data_circle_{}x{}_{}.bin", spins, steps, ratio)
}

/// Name of a mixed output file: the small source's stem followed by `suffix` and `.bin`.
pub fn mixed_output_name(small_source: &str, suffix: &str) -> String {
    let stem = Path::new(small_source)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(small_source);
    format!("{}{}.bin", stem, suffix)
}

/// Computes every output file and its record split up front.
///
/// Sources are never written to: a plan where any output path is also a source of
/// some entry is rejected.
pub fn build_plan(config: &SynthesisConfig) -> Result<SynthesisPlan, SynthesisError> {
    config.validate()?;

    let big_name = config.big_source.clone().unwrap_or_else(|| {
        circle_data_file_name(config.source_spins, config.source_steps, config.big_radius)
    });
    let big_source = config.data_dir.join(big_name);

    let entries = config
        .radii
        .iter()
        .map(|&radius| {
            let small_name =
                circle_data_file_name(config.source_spins, config.source_steps, radius);
            PlanEntry {
                radius,
                counts: split_counts(radius, config.big_radius, config.total_records),
                small_source: config.data_dir.join(&small_name),
                big_source: big_source.clone(),
                output: config
                    .output_dir
                    .join(mixed_output_name(&small_name, &config.output_suffix)),
            }
        })
        .collect::<Vec<PlanEntry>>();

    for entry in &entries {
        let collides = entries.iter().any(|other| {
            entry.output == other.small_source || entry.output == other.big_source
        });
        if collides {
            return Err(ConfigError::invalid(
                "synthesis",
                "output_suffix",
                format!("output {} would overwrite a source file", entry.output.display()),
            )
            .into());
        }
    }

    Ok(SynthesisPlan {
        record_size: config.record_size(),
        total_records: config.total_records,
        entries,
    })
}
