//! Task Planning
//!
//! Turns the bootstrap configuration into the list of tasks handed to the runner:
//! one task per input file, each with its own log path and full command line.

use super::types::Task;
use crate::config::BootstrapConfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PlanError {
    #[error("no input files configured")]
    NoInputs,

    #[error("input file name {0:?} has no stem to derive a log name from")]
    NoStem(String),

    #[error("inputs {first:?} and {second:?} would both log to {}", .log_path.display())]
    LogPathCollision {
        first: String,
        second: String,
        log_path: PathBuf,
    },
}

/// Log path for an input file: `<output_dir>/<stem><suffix>.txt`.
pub fn log_path_for(output_dir: &Path, input_name: &str, suffix: &str) -> Result<PathBuf, PlanError> {
    let stem = Path::new(input_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| PlanError::NoStem(input_name.to_string()))?;

    Ok(output_dir.join(format!("{}{}.txt", stem, suffix)))
}

/// Builds one task per configured input file.
///
/// Two inputs mapping to the same log file are rejected up front, since both
/// processes would otherwise write into the same file.
pub fn plan_tasks(config: &BootstrapConfig) -> Result<Vec<Task>, PlanError> {
    if config.input_files.is_empty() {
        return Err(PlanError::NoInputs);
    }

    let base_command = config.base_command();
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut tasks = Vec::with_capacity(config.input_files.len());

    for name in &config.input_files {
        let log_path = log_path_for(&config.output_dir, name, &config.log_suffix)?;

        if let Some(first) = seen.insert(log_path.clone(), name) {
            return Err(PlanError::LogPathCollision {
                first: first.to_string(),
                second: name.clone(),
                log_path,
            });
        }

        let input_path = config.input_dir.join(name);
        let mut command = base_command.clone();
        command.push(config.input_flag.clone());
        command.push(input_path.display().to_string());

        tasks.push(Task::new(name.clone(), log_path, command));
    }

    tracing::debug!("Planned {} bootstrap tasks", tasks.len());

    Ok(tasks)
}
